#[tokio::main]
async fn main() {
    proverbs_be::start_server().await;
}
