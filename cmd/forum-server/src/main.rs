//! # forum-server
//!
//! Assembles the forum from compile-time features and runtime settings, then
//! serves the RPC endpoint.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState};
use auth_adapters::Authenticator;
use configs::{LogFormat, MemberSeed, Settings, StorageBackend};
use domains::{CommunitySet, MemberDirectory, ReplyRepository, ThreadRepository, User, UserId};
use secrecy::ExposeSecret;
use services::Forum;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Stores {
    threads: Arc<dyn ThreadRepository>,
    replies: Arc<dyn ReplyRepository>,
    directory: Arc<dyn MemberDirectory>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings);

    let stores = build_stores(&settings).await?;
    let auth = build_authenticator(&settings)?;

    let communities = if settings.forum.communities.is_empty() {
        CommunitySet::default()
    } else {
        CommunitySet::new(&settings.forum.communities)
    };
    info!(communities = ?communities.iter().collect::<Vec<_>>(), "forum communities");

    let forum = Forum::new(stores.threads, stores.replies, stores.directory, communities);
    let app = router(AppState::new(forum, auth));

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, backend = ?settings.storage.backend, "forum-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("forum-server stopped");
    Ok(())
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match settings.log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn build_stores(settings: &Settings) -> anyhow::Result<Stores> {
    match settings.storage.backend {
        StorageBackend::Memory => {
            info!("using in-memory storage; data is lost on restart");
            let directory = storage_adapters::InMemoryMemberDirectory::new();
            for member in &settings.forum.members {
                directory.upsert(seed_user(member), member.admin, member.banned);
            }
            info!(members = settings.forum.members.len(), "member directory seeded");
            Ok(Stores {
                threads: Arc::new(storage_adapters::InMemoryThreadRepository::new()),
                replies: Arc::new(storage_adapters::InMemoryReplyRepository::new()),
                directory: Arc::new(directory),
            })
        }
        #[cfg(feature = "db-postgres")]
        StorageBackend::Postgres => {
            use storage_adapters::postgres::{connect, PgMemberDirectory, PgReplyRepository, PgThreadRepository};

            let pool = connect(
                settings.database.url.expose_secret(),
                settings.database.max_connections,
            )
            .await
            .context("connecting to postgres")?;
            let directory = PgMemberDirectory::new(pool.clone());
            for member in &settings.forum.members {
                directory
                    .upsert(&seed_user(member), member.admin, member.banned)
                    .await
                    .with_context(|| format!("seeding member {}", member.username))?;
            }
            info!(members = settings.forum.members.len(), "member directory seeded");
            Ok(Stores {
                threads: Arc::new(PgThreadRepository::new(pool.clone())),
                replies: Arc::new(PgReplyRepository::new(pool)),
                directory: Arc::new(directory),
            })
        }
        #[cfg(not(feature = "db-postgres"))]
        StorageBackend::Postgres => anyhow::bail!("postgres backend requested but the db-postgres feature is disabled"),
    }
}

fn seed_user(member: &MemberSeed) -> User {
    User {
        id: UserId::from_uuid(member.id),
        username: member.username.clone(),
    }
}

fn build_authenticator(settings: &Settings) -> anyhow::Result<Arc<dyn Authenticator>> {
    #[cfg(feature = "auth-jwt")]
    {
        let secret = settings.auth.jwt_secret.expose_secret();
        Ok(Arc::new(auth_adapters::JwtAuthenticator::new(secret.as_bytes())))
    }
    #[cfg(not(feature = "auth-jwt"))]
    {
        let _ = settings;
        anyhow::bail!("no authenticator compiled in; enable the auth-jwt feature")
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    info!("shutdown requested");
}
