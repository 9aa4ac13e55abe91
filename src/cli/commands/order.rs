use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::utils::{order_line, output_orders, output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum OrderCommands {
    #[command(about = "List orders, optionally by status")]
    List {
        #[arg(long, help = "pending, preparing, ready, completed or cancelled")]
        status: Option<String>,
    },

    #[command(about = "Show one order")]
    Show {
        #[arg(help = "Order id")]
        id: String,
    },

    #[command(about = "Set an order's status")]
    Status {
        #[arg(help = "Order id")]
        id: String,
        #[arg(help = "New status")]
        status: String,
    },

    #[command(about = "Show the oldest queued order")]
    Next,

    #[command(about = "Mark an order completed and remove it from the queue")]
    Complete {
        #[arg(help = "Order id")]
        id: String,
    },
}

pub async fn handle(client: &ApiClient, cmd: OrderCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        OrderCommands::List { status } => {
            let path = match status {
                Some(status) => format!("/api/kitchen/orders?status={}", status),
                None => "/api/kitchen/orders".to_string(),
            };
            let data = client.get(&path).await?;
            output_orders(output_format, &data)
        }
        OrderCommands::Show { id } => {
            let data = client.get(&format!("/api/kitchen/orders/{}", id)).await?;
            output_value(output_format, &data)
        }
        OrderCommands::Status { id, status } => {
            let data = client
                .put(&format!("/api/kitchen/orders/{}/status", id), &json!({ "status": status }))
                .await?;
            output_success(output_format, &format!("Order {} is now {}", id, status), Some(data))
        }
        OrderCommands::Next => {
            let data = client.get("/api/kitchen/queue/next").await?;
            if data.is_null() {
                return output_success(output_format, "Queue is empty", None);
            }
            match output_format {
                OutputFormat::Text => {
                    println!(
                        "{}  {}  table {}",
                        data["orderId"].as_str().unwrap_or("-"),
                        data["orderNumber"].as_str().unwrap_or("-"),
                        data["tableNumber"].as_str().unwrap_or("-"),
                    );
                    Ok(())
                }
                OutputFormat::Json => output_value(output_format, &data),
            }
        }
        OrderCommands::Complete { id } => {
            let data = client
                .post(&format!("/api/kitchen/orders/{}/complete", id), &json!({}))
                .await?;
            if output_format == OutputFormat::Text {
                println!("{}", order_line(&data));
            }
            output_success(output_format, &format!("Order {} completed", id), Some(data))
        }
    }
}
