use std::time::Duration;

use super::*;

async fn serve_pdf(server: &MockServer, file: &str, body: &[u8]) {
  Mock::given(method("GET"))
    .and(path(format!("/pdf/{file}")))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
    .mount(server)
    .await;
}

fn leftovers(dir: &Path) -> Vec<String> {
  std::fs::read_dir(dir)
    .unwrap()
    .map(|item| item.unwrap().file_name().to_string_lossy().into_owned())
    .collect()
}

#[traced_test]
#[tokio::test]
async fn test_fetch_streams_body_into_place() -> TestResult<()> {
  let server = MockServer::start().await;
  let content = b"%PDF-1.5\nsome pages\n%%EOF";
  serve_pdf(&server, "2403.00001v2.pdf", content).await;
  let dir = tempdir()?;
  let dest = dir.path().join("2403.00001v2.pdf");

  let fetcher = HttpFetcher::new(Duration::from_secs(10))?;
  let bytes = fetcher.fetch(&format!("{}/pdf/2403.00001v2.pdf", server.uri()), &dest).await?;

  assert_eq!(bytes, content.len() as u64);
  assert_eq!(std::fs::read(&dest)?, content);
  assert_eq!(leftovers(dir.path()), vec!["2403.00001v2.pdf"]);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_failed_fetch_leaves_nothing_behind() -> TestResult<()> {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/pdf/missing.pdf"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;
  let dir = tempdir()?;
  let dest = dir.path().join("missing.pdf");

  let fetcher = HttpFetcher::new(Duration::from_secs(10))?;
  let result = fetcher.fetch(&format!("{}/pdf/missing.pdf", server.uri()), &dest).await;

  assert!(matches!(result, Err(HarvesterError::ApiError(_))));
  assert!(leftovers(dir.path()).is_empty());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_timeout_is_a_network_error() -> TestResult<()> {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/pdf/slow.pdf"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_bytes(b"%PDF".to_vec())
        .set_delay(Duration::from_secs(5)),
    )
    .mount(&server)
    .await;
  let dir = tempdir()?;
  let dest = dir.path().join("slow.pdf");

  let fetcher = HttpFetcher::new(Duration::from_millis(200))?;
  let result = fetcher.fetch(&format!("{}/pdf/slow.pdf", server.uri()), &dest).await;

  assert!(matches!(result, Err(HarvesterError::Network(_))));
  assert!(leftovers(dir.path()).is_empty());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_download_all_isolates_server_errors() -> TestResult<()> {
  let server = MockServer::start().await;
  serve_pdf(&server, "1001v1.pdf", b"%PDF one").await;
  Mock::given(method("GET"))
    .and(path("/pdf/1002v1.pdf"))
    .respond_with(ResponseTemplate::new(500))
    .mount(&server)
    .await;
  serve_pdf(&server, "1003v1.pdf", b"%PDF three").await;

  let catalog: Catalog = ["1001", "1002", "1003"]
    .into_iter()
    .map(|id| {
      let mut entry = Entry::from_feed(sample_record(id)).unwrap();
      entry.links = vec![Link::pdf(format!("{}/pdf/{id}v1", server.uri()))];
      entry
    })
    .collect();
  let dir = tempdir()?;
  let options = DownloadOptions::new(dir.path()).with_rate_limit(RateLimit::none());
  let fetcher = HttpFetcher::new(options.timeout)?;

  let report = download_all(&catalog, &fetcher, &options).await?;

  assert_eq!(report.attempted, 3);
  assert_eq!(report.succeeded, 2);
  assert_eq!(report.failures.len(), 1);
  assert_eq!(report.failures[0].id, "1002");
  assert_eq!(std::fs::read(dir.path().join("1001v1.pdf"))?, b"%PDF one");
  assert_eq!(std::fs::read(dir.path().join("1003v1.pdf"))?, b"%PDF three");
  assert!(!dir.path().join("1002v1.pdf").exists());
  assert!(!dir.path().join("1002v1.pdf.part").exists());
  Ok(())
}

fn sample_record(id: &str) -> harvester::feed::FeedRecord {
  let xml = atom_page(&[&format!("{id}v1")], "http://arxiv.org");
  harvester::feed::parse_feed(&xml).unwrap().remove(0)
}
