use std::sync::Arc;

use cantina_api::{
    config::AppConfig,
    db,
    entities::{dish, dish_ingredient, ingredient, ingredient_stock, user, user::Role},
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;
use uuid::Uuid;

/// Test harness: application state backed by a throwaway SQLite database
/// with all migrations applied.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let db_path = tmp.path().join("cantina_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_testing_purposes_only".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db = Arc::new(pool);
        let (event_sender, event_rx) = EventSender::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db.clone(), event_sender.clone(), &cfg);
        let state = AppState {
            db,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            state,
            _event_task: event_task,
            _tmp: tmp,
        }
    }

    /// Inserts an account directly; password hashing is skipped because
    /// service-level tests never log in.
    pub async fn seed_user(&self, role: Role, balance: Decimal) -> user::Model {
        let id = Uuid::new_v4();
        let row = user::ActiveModel {
            id: Set(id),
            username: Set(format!("user-{}", id.simple())),
            email: Set(format!("{}@test.example", id.simple())),
            password_hash: Set("not-a-real-hash".to_string()),
            role: Set(role),
            phone: Set(None),
            balance: Set(balance),
            bonus_points: Set(0),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        row.insert(&*self.state.db)
            .await
            .expect("failed to seed user")
    }

    pub async fn seed_category(&self, name: &str) -> Uuid {
        let created = self
            .state
            .services
            .catalog
            .create_category(name.to_string(), String::new())
            .await
            .expect("failed to seed category");
        created.id
    }

    /// Ingredient plus its stock row at the given level.
    pub async fn seed_ingredient(
        &self,
        name: &str,
        unit: &str,
        stock: Decimal,
        min: Decimal,
    ) -> ingredient::Model {
        let ing = ingredient::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            unit: Set(unit.to_string()),
        };
        let ing = ing
            .insert(&*self.state.db)
            .await
            .expect("failed to seed ingredient");

        let stock_row = ingredient_stock::ActiveModel {
            id: Set(Uuid::new_v4()),
            ingredient_id: Set(ing.id),
            current_quantity: Set(stock),
            min_quantity: Set(min),
            unit: Set(unit.to_string()),
            last_restocked: Set(Utc::now()),
        };
        stock_row
            .insert(&*self.state.db)
            .await
            .expect("failed to seed stock");

        ing
    }

    /// Dish with a recipe, available by default.
    pub async fn seed_dish(
        &self,
        name: &str,
        price: Decimal,
        category_id: Uuid,
        recipe: &[(Uuid, Decimal)],
    ) -> dish::Model {
        let row = dish::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(String::new()),
            price: Set(price),
            category_id: Set(category_id),
            is_available: Set(true),
            created_by: Set(None),
            created_at: Set(Utc::now()),
        };
        let d = row
            .insert(&*self.state.db)
            .await
            .expect("failed to seed dish");

        for (ingredient_id, quantity) in recipe {
            let line = dish_ingredient::ActiveModel {
                id: Set(Uuid::new_v4()),
                dish_id: Set(d.id),
                ingredient_id: Set(*ingredient_id),
                quantity: Set(*quantity),
            };
            line.insert(&*self.state.db)
                .await
                .expect("failed to seed recipe line");
        }

        d
    }

    pub async fn stock_level(&self, ingredient_id: Uuid) -> Decimal {
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
        ingredient_stock::Entity::find()
            .filter(ingredient_stock::Column::IngredientId.eq(ingredient_id))
            .one(&*self.state.db)
            .await
            .expect("stock query failed")
            .expect("stock row missing")
            .current_quantity
    }

    pub async fn balance_of(&self, user_id: Uuid) -> Decimal {
        use sea_orm::EntityTrait;
        user::Entity::find_by_id(user_id)
            .one(&*self.state.db)
            .await
            .expect("user query failed")
            .expect("user missing")
            .balance
    }
}
