//! HTTP request handlers.

pub(crate) mod cache;
pub(crate) mod navigation;
pub(crate) mod pages;
pub(crate) mod status;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response};
    use plugdocs_cache::MemoryCache;
    use plugdocs_config::Config;
    use plugdocs_remote::{MockHost, RateLimiter, RemoteFetcher};
    use plugdocs_site::Site;
    use tower::ServiceExt;

    use crate::app::create_router;
    use crate::state::AppState;

    const CONFIG: &str = r#"
[[repositories]]
repository_url = "https://github.com/acme/widgets"
description = "Widget plugin"
latest_version = "2.x"

[[repositories.versions]]
version = "2.x"
branch = "main"
limited_files = [{ name = "README.md" }, { name = "ALIAS.md" }]
"#;

    /// Router over a site with two pages, listing already built.
    pub(crate) async fn router() -> Router {
        let config = Config::from_toml(CONFIG).unwrap();
        let host = MockHost::new()
            .with_file("acme", "widgets", "main", "README.md", "# Widgets\n\n## Install\n")
            .with_file("acme", "widgets", "main", "ALIAS.md", "---\nsource: widgets/2.x/gone\n---\n");
        let fetcher = RemoteFetcher::new(
            Arc::new(host),
            Arc::new(MemoryCache::new()),
            Arc::new(RateLimiter::new(
                100,
                Duration::from_secs(3600),
                Duration::from_secs(1),
            )),
        );
        let site = Arc::new(Site::new(&config, Arc::new(fetcher)).unwrap());
        site.reload().await;

        create_router(Arc::new(AppState {
            site,
            version: "1.0.0".to_owned(),
        }))
    }

    pub(crate) async fn send(router: Router, request: Request<Body>) -> Response<Body> {
        router.oneshot(request).await.unwrap()
    }

    pub(crate) fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub(crate) async fn json(response: Response<Body>) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
