use super::*;

/// Sync from a feed, persist, reload in a fresh store handle, then fetch every artifact.
#[traced_test]
#[tokio::test]
async fn test_sync_persist_download() -> TestResult<()> {
  let server = MockServer::start().await;
  let host = server.uri();
  mount_page(&server, 0, atom_page(&["2403.00001v1", "2403.00001v2", "2403.00002v1"], &host))
    .await;
  mount_page(&server, 3, atom_page(&[], &host)).await;
  for file in ["2403.00001v2.pdf", "2403.00002v1.pdf"] {
    Mock::given(method("GET"))
      .and(path(format!("/pdf/{file}")))
      .respond_with(ResponseTemplate::new(200).set_body_bytes(format!("%PDF {file}").into_bytes()))
      .expect(1)
      .mount(&server)
      .await;
  }

  let dir = tempdir()?;
  let db_path = dir.path().join("catalog.db");
  let pdf_dir = dir.path().join("pdf");

  let store = Database::open(&db_path).await?;
  let mut catalog = store.load().await;
  assert!(catalog.is_empty());

  let options = SyncOptions::new("cat:cs.LG")
    .with_page_size(3)
    .with_max_index(30)
    .with_rate_limit(RateLimit::none());
  let report = sync(&mut catalog, &mock_feed(&server), &options).await?;
  assert_eq!(report.total_added, 2);
  assert_eq!(report.stop_reason, StopReason::EmptyPage);
  store.save(&catalog).await?;

  let reloaded = Database::open(&db_path).await?.load().await;
  assert_eq!(reloaded, catalog);
  assert_eq!(reloaded.version("2403.00001"), Some(2));

  let download = DownloadOptions::new(&pdf_dir).with_rate_limit(RateLimit::none());
  let fetcher = HttpFetcher::new(download.timeout)?;
  let first = download_all(&reloaded, &fetcher, &download).await?;
  assert_eq!(first.succeeded, 2);
  assert!(first.failures.is_empty());
  assert_eq!(std::fs::read(pdf_dir.join("2403.00001v2.pdf"))?, b"%PDF 2403.00001v2.pdf");

  // Everything is on disk now, so a second pass must not hit the server again.
  let second = download_all(&reloaded, &fetcher, &download).await?;
  assert_eq!(second.already_present, 2);
  assert_eq!(second.succeeded, 2);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_failed_sync_keeps_store_untouched() -> TestResult<()> {
  let server = MockServer::start().await;
  mount_page(&server, 0, atom_page(&["1000v1"], "http://arxiv.org")).await;
  mount_page(&server, 1, atom_page(&["1001vx"], "http://arxiv.org")).await;

  let dir = tempdir()?;
  let store = Database::open(dir.path().join("catalog.db")).await?;
  let seed = harvester::feed::parse_feed(&atom_page(&["0999v4"], "http://arxiv.org"))?;
  let before: Catalog = seed.into_iter().map(Entry::from_feed).collect::<Result<_, _>>()?;
  store.save(&before).await?;

  let mut catalog = store.load().await;
  let options = SyncOptions::new("cat:cs.LG")
    .with_page_size(1)
    .with_max_index(10)
    .with_rate_limit(RateLimit::none());
  let result = sync(&mut catalog, &mock_feed(&server), &options).await;

  assert!(matches!(result, Err(HarvesterError::MalformedIdentifier(_))));
  assert!(catalog.contains("1000"));
  assert_eq!(store.load().await, before);
  Ok(())
}
