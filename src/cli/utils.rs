use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message, merging `data` into the JSON form
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a value as pretty JSON, or as `key: value` lines in text mode
pub fn output_value(output_format: OutputFormat, value: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => match value {
            Value::Object(map) => {
                for (key, v) in map {
                    println!("{}: {}", key, text_of(v));
                }
            }
            other => println!("{}", text_of(other)),
        },
    }
    Ok(())
}

/// Output a list of orders, one line each in text mode
pub fn output_orders(output_format: OutputFormat, orders: &Value) -> anyhow::Result<()> {
    let list = orders.as_array().cloned().unwrap_or_default();
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "orders": list }))?),
        OutputFormat::Text => {
            if list.is_empty() {
                println!("No orders");
            }
            for order in &list {
                println!("{}", order_line(order));
            }
        }
    }
    Ok(())
}

pub fn order_line(order: &Value) -> String {
    format!(
        "{}  {}  table {}  {}  total {}",
        text_of(&order["orderId"]),
        text_of(&order["orderNumber"]),
        text_of(&order["tableNumber"]),
        text_of(&order["status"]),
        text_of(&order["total"]),
    )
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
