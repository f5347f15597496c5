//! Shared fixtures for in-process tests.

use chrono::NaiveDate;
use tempfile::TempDir;

use crate::{
    config::Config,
    db::{self, connect_in_memory, Db},
    middleware::auth_guard::AuthUser,
    models::{TaskStatus, WeeklyTaskStatus},
    services::{
        goals::{create_goal, NewGoal},
        regions::{create_region, NewRegion},
        tasks::{create_task, NewTask},
        users::create_user,
        weekly_tasks::{create_weekly_task, NewWeeklyTask},
    },
    state::AppState,
    week::WeekStart,
};

pub async fn test_state() -> AppState {
    AppState::new(connect_in_memory().await, Config::for_tests())
}

/// A freshly created account, as the session middleware would resolve it.
pub async fn signed_in(state: &AppState, email: &str) -> AuthUser {
    let user = create_user(&state.pool, email).await.expect("create test user");
    AuthUser { user_id: user.id, email: user.email }
}

pub async fn count(state: &AppState, table: &str) -> i64 {
    count_rows(&state.pool, table).await
}

pub async fn count_rows(pool: &Db, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count rows")
}

/// A database file in a temporary directory, opened through the production
/// `db::connect` with several connections. Removed on drop.
pub struct FileDb {
    pub pool: Db,
    _dir:     TempDir,
}

pub async fn file_backed_db(connections: u32) -> FileDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = Config {
        database_url:       format!("sqlite://{}", dir.path().join("goaltracker.db").display()),
        db_max_connections: connections,
        ..Config::for_tests()
    };

    let pool = db::connect(&config).await.expect("file-backed sqlite pool");
    db::run_migrations(&pool).await.expect("migrations");
    FileDb { pool, _dir: dir }
}

/// Ids of one goal with a region, two tasks and one weekly task under the first task.
pub struct GoalTree {
    pub goal_id:        String,
    pub region_id:      String,
    pub task_ids:       [String; 2],
    pub weekly_task_id: String,
}

pub async fn goal_tree(pool: &Db, user_id: &str) -> GoalTree {
    let goal = create_goal(pool, user_id, &NewGoal { title: "Goal".into(), description: None })
        .await
        .expect("create goal");

    let region = create_region(
        pool,
        user_id,
        &NewRegion { goal_id: goal.id.clone(), title: "Region".into(), description: None },
    )
    .await
    .expect("create region")
    .expect("goal is owned");

    let mut task_ids = Vec::with_capacity(2);
    for title in ["First", "Second"] {
        let task = create_task(
            pool,
            user_id,
            &NewTask {
                region_id:   region.id.clone(),
                title:       title.into(),
                description: None,
                deadline:    NaiveDate::from_ymd_opt(2026, 12, 31).expect("valid date"),
                status:      TaskStatus::Active,
            },
        )
        .await
        .expect("create task")
        .expect("region is owned");
        task_ids.push(task.id);
    }
    let [first, second]: [String; 2] = task_ids.try_into().expect("two tasks");

    let weekly = create_weekly_task(
        pool,
        user_id,
        &NewWeeklyTask {
            task_id:         first.clone(),
            title:           "This week".into(),
            description:     None,
            priority:        1,
            week_start_date: WeekStart::current(),
            status:          WeeklyTaskStatus::Pending,
        },
    )
    .await
    .expect("create weekly task")
    .expect("task is owned");

    GoalTree {
        goal_id:        goal.id,
        region_id:      region.id,
        task_ids:       [first, second],
        weekly_task_id: weekly.id,
    }
}
