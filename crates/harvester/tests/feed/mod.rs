use super::*;

#[traced_test]
#[tokio::test]
async fn test_fetch_page_from_mock_feed() -> TestResult<()> {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/query"))
    .and(query_param("search_query", "cat:cs.LG"))
    .and(query_param("sortBy", "lastUpdatedDate"))
    .and(query_param("start", "0"))
    .and(query_param("max_results", "2"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_string(atom_page(&["2403.00001v2", "2403.00002v1"], "http://arxiv.org")),
    )
    .expect(1)
    .mount(&server)
    .await;

  let records = mock_feed(&server).fetch_page("cat:cs.LG", 0, 2).await?;

  assert_eq!(records.len(), 2);
  assert_eq!(records[0].id_url, "http://arxiv.org/abs/2403.00001v2");
  assert_eq!(records[0].title, "Paper 2403.00001v2");
  assert_eq!(records[0].primary_category.as_deref(), Some("cs.LG"));

  let entry = Entry::from_feed(records[0].clone())?;
  assert_eq!(entry.id, "2403.00001");
  assert_eq!(entry.version, 2);
  assert_eq!(entry.artifact_url()?, "http://arxiv.org/pdf/2403.00001v2.pdf");
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_http_error_is_api_error() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/query"))
    .respond_with(ResponseTemplate::new(503))
    .mount(&server)
    .await;

  let result = mock_feed(&server).fetch_page("cat:cs.LG", 0, 100).await;

  match result {
    Err(HarvesterError::ApiError(message)) => assert!(message.contains("503")),
    other => panic!("expected an API error, got {other:?}"),
  }
}

#[traced_test]
#[tokio::test]
async fn test_sync_stops_on_empty_page() -> TestResult<()> {
  let server = MockServer::start().await;
  mount_page(&server, 0, atom_page(&["1000v1", "1000v2"], "http://arxiv.org")).await;
  mount_page(&server, 2, atom_page(&["1001v1", "1002v3"], "http://arxiv.org")).await;
  mount_page(&server, 4, atom_page(&[], "http://arxiv.org")).await;

  let mut catalog = Catalog::new();
  let options = SyncOptions::new("cat:cs.LG")
    .with_page_size(2)
    .with_max_index(100)
    .with_rate_limit(RateLimit::none());
  let report = sync(&mut catalog, &mock_feed(&server), &options).await?;

  assert_eq!(report.stop_reason, StopReason::EmptyPage);
  assert_eq!(report.pages, 3);
  assert_eq!(report.total_added, 3);
  assert_eq!(catalog.version("1000"), Some(2));
  assert_eq!(catalog.version("1002"), Some(3));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_sync_stops_when_nothing_new() -> TestResult<()> {
  let server = MockServer::start().await;
  mount_page(&server, 0, atom_page(&["1000v1"], "http://arxiv.org")).await;
  mount_page(&server, 1, atom_page(&["1001v1"], "http://arxiv.org")).await;

  let mut catalog: Catalog =
    [Entry::from_feed(mock_feed(&server).fetch_page("cat:cs.LG", 0, 1).await?.remove(0))?]
      .into_iter()
      .collect();
  let options = SyncOptions::new("cat:cs.LG")
    .with_page_size(1)
    .with_max_index(10)
    .with_rate_limit(RateLimit::none());
  let report = sync(&mut catalog, &mock_feed(&server), &options).await?;

  assert_eq!(report.stop_reason, StopReason::NoNewEntries);
  assert_eq!(report.pages, 1);
  assert_eq!(report.total_skipped, 1);
  assert!(!catalog.contains("1001"));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_sync_stops_on_unreadable_page() -> TestResult<()> {
  let server = MockServer::start().await;
  mount_page(&server, 0, atom_page(&["1000v1"], "http://arxiv.org")).await;
  mount_page(&server, 1, "<html>Rate limit exceeded".to_string()).await;
  mount_page(&server, 2, atom_page(&["1001v1"], "http://arxiv.org")).await;

  let mut catalog = Catalog::new();
  let options = SyncOptions::new("cat:cs.LG")
    .with_page_size(1)
    .with_max_index(10)
    .with_rate_limit(RateLimit::none());
  let report = sync(&mut catalog, &mock_feed(&server), &options).await?;

  assert_eq!(report.stop_reason, StopReason::MalformedPage);
  assert_eq!(report.total_added, 1);
  assert_eq!(report.pages, 2);
  assert!(catalog.contains("1000"));
  assert!(!catalog.contains("1001"));
  Ok(())
}
