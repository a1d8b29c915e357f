use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use http::StatusCode;
use maud::{html, Markup, PreEscaped};
use tower_csrf_pair::{Csrf, SharedSecret, Token};

// Re-reads the token cookie before every htmx request, as the guard expects.
const PREFILTER: &str = r#"
document.body.addEventListener("htmx:configRequest", (event) => {
    const cookie = document.cookie
        .split("; ")
        .find((row) => row.startsWith("csrf_token="));
    const token = cookie && cookie.slice("csrf_token=".length);
    if (token) {
        event.detail.headers["X-CSRF-Token"] = token;
    }
});
"#;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("tower_csrf_pair=debug,info")
        .init();

    let secret = std::env::var("CSRF_SECRET").unwrap_or_else(|_| {
        let secret = SharedSecret::generate();
        tracing::warn!("CSRF_SECRET not set, using a throwaway secret");
        secret
    });
    let secret = SharedSecret::from_hex(&secret).expect("CSRF_SECRET must be 64 hex characters");

    let app = Router::new()
        .route("/", get(root))
        .route("/submit", post(submit))
        .layer(Csrf::new(secret).secure(false));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}

async fn root(token: Token) -> Markup {
    html! {
        link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
        script src="https://unpkg.com/htmx.org@2.0.2" {}

        main class="container" {
            p { mark { "Open the Network tab in your dev console." } }
            p { small { kbd { (token) } } }

            div class="grid" {
                div {
                    form hx-post="/submit" hx-swap="none" {
                        label for="hotdogs" { "How do you like your hotdogs?" }

                        select name="hotdogs" value="ketchup" {
                            option value="ketchup" { "Ketchup" }
                            option value="ketchup-again" { "Ketchup" }
                            option value="more-ketchup" { "More ketchup" }
                        }

                        button type="submit" { "Submit with header" }
                    }
                }

                div {
                    form method="post" action="/submit" {
                        input type="hidden" name="authenticity_token" value=(token);

                        label for="mustard" { "Mustard?" }

                        select name="mustard" value="never" {
                            option value="never" { "Never" }
                            option value="still-never" { "Still never" }
                        }

                        button type="submit" { "Submit with form field" }
                    }
                }
            }

            script { (PreEscaped(PREFILTER)) }
        }
    }
}

async fn submit() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Success!")
}
