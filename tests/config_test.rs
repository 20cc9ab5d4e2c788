// ==========================================
// 配置管理器测试
// ==========================================
// 职责: 验证默认值、global/项目级覆写、格式错误回退、快照
// ==========================================


use material_forecast_aps::config::{
    config_keys, ConfigManager, ConfigScope, ForecastConfig, ForecastConfigReader,
};
use std::sync::Arc;
use test_helpers::{create_test_db, insert_config, open_test_connection};

#[tokio::test]
async fn test_defaults_when_table_is_empty() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();

    let config = manager.load_forecast_config(None).await.unwrap();
    assert_eq!(config, ForecastConfig::default());

    let config = manager.load_forecast_config(Some(1)).await.unwrap();
    assert_eq!(config, ForecastConfig::default());
}

#[tokio::test]
async fn test_project_scope_overrides_global() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    insert_config(&conn, "global", config_keys::DUE_SOON_DAYS, "5").unwrap();
    insert_config(&conn, "global", config_keys::MAX_ROWS, "50").unwrap();
    insert_config(&conn, "project/3", config_keys::DUE_SOON_DAYS, "2").unwrap();
    drop(conn);

    let manager = ConfigManager::new(&db_path).unwrap();

    assert_eq!(manager.get_due_soon_days(Some(3)).await.unwrap(), 2);
    assert_eq!(manager.get_due_soon_days(Some(4)).await.unwrap(), 5);
    assert_eq!(manager.get_due_soon_days(None).await.unwrap(), 5);

    // 项目未覆写的键回落到 global
    assert_eq!(manager.get_max_rows(Some(3)).await.unwrap(), 50);
}

#[tokio::test]
async fn test_bad_value_falls_back_to_default() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    insert_config(&conn, "global", config_keys::LOOKAHEAD_DAYS, "thirty").unwrap();
    insert_config(&conn, "global", config_keys::SNAPSHOT_MAX_ROWS, "-3").unwrap();
    insert_config(&conn, "global", config_keys::USAGE_WINDOW_DAYS, " 21 ").unwrap();
    drop(conn);

    let manager = ConfigManager::new(&db_path).unwrap();
    assert_eq!(manager.get_lookahead_days(None).await.unwrap(), 30);
    assert_eq!(manager.get_snapshot_max_rows(None).await.unwrap(), 8);
    assert_eq!(manager.get_usage_window_days(None).await.unwrap(), 21);
}

#[tokio::test]
async fn test_loaded_config_is_normalized() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    insert_config(&conn, "global", config_keys::LOOKAHEAD_DAYS, "-10").unwrap();
    insert_config(&conn, "global", config_keys::USAGE_WINDOW_DAYS, "0").unwrap();
    drop(conn);

    let manager = ConfigManager::new(&db_path).unwrap();
    let config = manager.load_forecast_config(None).await.unwrap();
    assert_eq!(config.lookahead_days, 0);
    assert_eq!(config.usage_window_days, 1);
}

#[tokio::test]
async fn test_load_forecast_config_runs_on_spawned_task() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    insert_config(&conn, "project/2", config_keys::DUE_SOON_DAYS, "4").unwrap();
    drop(conn);

    let manager = Arc::new(ConfigManager::new(&db_path).unwrap());
    let handle = tokio::spawn(async move {
        manager
            .load_forecast_config(Some(2))
            .await
            .map_err(|e| e.to_string())
    });

    let config = handle.await.unwrap().unwrap();
    assert_eq!(config.due_soon_days, 4);
    assert_eq!(config.lookahead_days, ForecastConfig::default().lookahead_days);
}

#[tokio::test]
async fn test_set_config_value_upserts() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();
    let scope = ConfigScope::Project { project_id: 9 };

    manager
        .set_config_value(scope, config_keys::MAX_ROWS, "12")
        .unwrap();
    assert_eq!(manager.get_max_rows(Some(9)).await.unwrap(), 12);

    manager
        .set_config_value(scope, config_keys::MAX_ROWS, "15")
        .unwrap();
    assert_eq!(
        manager
            .get_scoped_value(scope, config_keys::MAX_ROWS)
            .unwrap()
            .as_deref(),
        Some("15")
    );
    assert_eq!(
        manager
            .get_scoped_value(ConfigScope::Global, config_keys::MAX_ROWS)
            .unwrap(),
        None
    );
}

#[test]
fn test_config_snapshot_is_sorted_json() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();
    manager
        .set_config_value(ConfigScope::Global, config_keys::MAX_ROWS, "40")
        .unwrap();
    manager
        .set_config_value(ConfigScope::Global, config_keys::DUE_SOON_DAYS, "3")
        .unwrap();

    let snapshot = manager.get_config_snapshot(ConfigScope::Global).unwrap();
    assert_eq!(
        snapshot,
        r#"{"forecast_due_soon_days":"3","forecast_max_rows":"40"}"#
    );

    let empty = manager
        .get_config_snapshot(ConfigScope::Project { project_id: 1 })
        .unwrap();
    assert_eq!(empty, "{}");
}

#[test]
fn test_scope_ids() {
    assert_eq!(ConfigScope::Global.scope_id(), "global");
    assert_eq!(ConfigScope::Project { project_id: 4 }.scope_id(), "project/4");
}
