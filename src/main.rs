#[tokio::main]
async fn main() {
    storeratings::start_server().await;
}
