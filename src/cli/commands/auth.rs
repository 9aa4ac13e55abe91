use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Send a registration OTP")]
    RegisterSend {
        #[arg(help = "Mobile number")]
        mobile: String,
    },

    #[command(about = "Verify a registration OTP and create the account")]
    RegisterVerify {
        #[arg(long, help = "Session id returned by register-send")]
        session: String,
        #[arg(help = "The 6 digit code")]
        otp: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long, help = "Mobile number (defaults to the one the code was sent to)")]
        mobile: Option<String>,
    },

    #[command(about = "Send a login OTP")]
    LoginSend {
        #[arg(help = "Mobile number")]
        mobile: String,
    },

    #[command(about = "Verify a login OTP and print the token")]
    LoginVerify {
        #[arg(long, help = "Session id returned by login-send")]
        session: String,
        #[arg(help = "The 6 digit code")]
        otp: String,
    },

    #[command(about = "Show the user behind a token")]
    Whoami {
        #[arg(long, env = "CAFE_TOKEN", help = "JWT from register-verify or login-verify")]
        token: String,
    },
}

pub async fn handle(client: &ApiClient, cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::RegisterSend { mobile } => {
            let data = client
                .post("/auth/register/send", &json!({ "mobile": mobile }))
                .await?;
            report_sent(output_format, data)
        }
        AuthCommands::RegisterVerify {
            session,
            otp,
            name,
            surname,
            mobile,
        } => {
            let data = client
                .with_session(session)
                .post(
                    "/auth/register/verify",
                    &json!({ "otp": otp, "name": name, "surname": surname, "mobile": mobile }),
                )
                .await?;
            report_grant(output_format, "Registered", data)
        }
        AuthCommands::LoginSend { mobile } => {
            let data = client
                .post("/auth/login/send", &json!({ "mobile": mobile }))
                .await?;
            report_sent(output_format, data)
        }
        AuthCommands::LoginVerify { session, otp } => {
            let data = client
                .with_session(session)
                .post("/auth/login/verify", &json!({ "otp": otp }))
                .await?;
            report_grant(output_format, "Logged in", data)
        }
        AuthCommands::Whoami { token } => {
            let data = client.with_token(token).get("/api/auth/whoami").await?;
            output_value(output_format, &data)
        }
    }
}

fn report_sent(output_format: OutputFormat, data: Value) -> anyhow::Result<()> {
    if output_format == OutputFormat::Text {
        println!("Session: {}", data["session_id"].as_str().unwrap_or("-"));
        if let Some(code) = data["delivery"]["code"].as_str() {
            println!("SMS unavailable, fallback code: {}", code);
        }
    }
    let message = data["message"].as_str().unwrap_or("OTP sent").to_string();
    output_success(output_format, &message, Some(data))
}

fn report_grant(output_format: OutputFormat, message: &str, data: Value) -> anyhow::Result<()> {
    if output_format == OutputFormat::Text {
        println!("Token: {}", data["token"].as_str().unwrap_or("-"));
    }
    output_success(output_format, message, Some(data))
}
