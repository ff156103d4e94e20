//! Example: an ApiModule with a validated body, served over HTTP.

use jsonroute_rs::{ApiModule, Application, CoreError, Parameters, PipelineConfig, ServerConfig};
use serde_json::{json, Value};

fn create_order(params: &Parameters) -> Result<Value, CoreError> {
    Ok(json!({ "ok": true, "sku": params["_sku"], "quantity": params["_quantity"] }))
}

fn read_order(params: &Parameters) -> Result<Value, CoreError> {
    Ok(json!({ "order_id": params["id"], "status": "created" }))
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut app = Application::with_config(PipelineConfig::from_env()?);
    let order_body = json!({
        "type": "object",
        "properties": {
            "sku": {"type": "string", "pattern": "^[A-Z]+-[0-9]+$"},
            "quantity": {"type": "integer"}
        },
        "required": ["sku", "quantity"],
        "additionalProperties": false
    });
    let mut orders = ApiModule::new("Orders", None)
        .route("/", "Order", "POST", Some(order_body), create_order)
        .route("/<id>", "Order", "GET", None, read_order);
    app.register(&mut orders)?;

    let config = ServerConfig::from_env("127.0.0.1", 8000);
    println!("Listening on http://{}", config.addr());
    println!("  POST /orders   {{\"sku\": \"AB-1\", \"quantity\": 2}}");
    println!("  GET  /orders/<id>");
    app.run(&config, "Orders API")
}
