#[cfg(test)]
pub mod test_utils {
    use crate::config::{build_app_state, Settings};
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use axum_test::TestServer;
    use betting::{AdminSeed, ScriptedRolls};
    use migration::{Migrator, MigratorTrait};
    use model::entities::user;
    use sea_orm::{Database, DatabaseConnection};
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const ADMIN_PASSWORD: &str = "AdminPassword123!";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    pub fn test_settings() -> Settings {
        Settings {
            database_url: "sqlite::memory:".to_string(),
            bcrypt_cost: 4,
            ..Settings::default()
        }
    }

    /// Create AppState for testing. Races consume `rolls` first.
    pub async fn setup_test_app_state(rolls: Arc<ScriptedRolls>) -> AppState {
        let db = setup_test_db().await;
        build_app_state(db, test_settings(), rolls)
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// A running test server plus handles to steer it.
    pub struct TestApp {
        pub server: TestServer,
        pub state: AppState,
        pub rolls: Arc<ScriptedRolls>,
    }

    impl TestApp {
        /// Seeds the bootstrap admin straight through the core.
        pub async fn seed_admin(&self, username: &str) -> user::Model {
            self.state
                .accounts
                .ensure_admin(
                    &self.state.db,
                    AdminSeed {
                        team_id: self.state.settings.default_team_id,
                        username: username.to_string(),
                        password: ADMIN_PASSWORD.to_string(),
                        display_name: "Administrator".to_string(),
                        wallet: 50_000,
                    },
                )
                .await
                .expect("Failed to seed admin")
        }
    }

    pub async fn setup_test_router() -> (Router, AppState, Arc<ScriptedRolls>) {
        let rolls = Arc::new(ScriptedRolls::default());
        let state = setup_test_app_state(rolls.clone()).await;
        (create_router(state.clone()), state, rolls)
    }

    /// Create a test server for the full app
    pub async fn setup_test_app() -> TestApp {
        let (router, state, rolls) = setup_test_router().await;
        let server = TestServer::new(router).expect("Failed to start test server");
        TestApp { server, state, rolls }
    }
}
