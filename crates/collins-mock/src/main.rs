//! Run the mock Collins server standalone, for poking at with curl.

use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let addr = std::env::var("COLLINS_MOCK_ADDR").unwrap_or_else(|_| "127.0.0.1:9000".to_string());
    let listener = TcpListener::bind(&addr).await?;
    println!("mock collins listening on http://{addr}");
    collins_mock::run(listener).await
}
