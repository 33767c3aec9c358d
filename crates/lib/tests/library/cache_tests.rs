//! Download cache behaviour under concurrency.

use std::time::Duration;

use forge_lib::cache::DownloadCache;
use forge_lib::util::hash::hash_bytes;
use tempfile::TempDir;

#[tokio::test]
async fn concurrent_acquisitions_share_one_download() {
  let body = b"tarball bytes".to_vec();
  let sha = hash_bytes(&body).0;

  let mut server = mockito::Server::new_async().await;
  let mock = server
    .mock("GET", "/pixman-0.42.2.tar.gz")
    .with_body(body.clone())
    .expect(1)
    .create_async()
    .await;
  let url = format!("{}/pixman-0.42.2.tar.gz", server.url());

  let temp = TempDir::new().unwrap();
  let cache = DownloadCache::new(temp.path(), Duration::from_secs(10)).unwrap();

  let mut tasks = tokio::task::JoinSet::new();
  for _ in 0..4 {
    let cache = cache.clone();
    let url = url.clone();
    let sha = sha.clone();
    tasks.spawn(async move { cache.fetch(&url, &sha).await });
  }

  let mut paths = Vec::new();
  while let Some(joined) = tasks.join_next().await {
    paths.push(joined.unwrap().unwrap());
  }

  mock.assert_async().await;
  assert_eq!(cache.network_fetches(), 1);
  assert!(paths.windows(2).all(|w| w[0] == w[1]));
  assert_eq!(std::fs::read(&paths[0]).unwrap(), body);
}
