use tesla_api::{ApiError, Client, Request};

#[tokio::main]
pub async fn main() -> Result<(), ApiError> {
    let client = Client::new("access_token");

    let orders = client.send(Request::orders().list()).await?;
    for order in orders.response {
        let req = Request::orders().details(order.reference_number.clone());
        let details = client.send(req).await?;
        println!("{}: tasks present = {}", order.reference_number, details.has_tasks());
    }
    Ok(())
}
