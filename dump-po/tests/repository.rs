use std::sync::Arc;

use dump_data::prelude::*;
use dump_data::{Operation, Outcome};
use dump_data_sqlx::Database;
use dump_po::{create_schema, Cart, Goods, GoodsRepository, Order, OrderLog};
use dump_prometheus::{MetricsConfig, PrometheusMetrics};
use dump_test::{LogCapture, TestDb};

async fn setup() -> TestDb {
    let tdb = TestDb::new().await;
    create_schema(tdb.db()).await.unwrap();
    tdb
}

fn goods(id: i64, name: &str, price: i64, tag: &str) -> Goods {
    Goods {
        id,
        name: name.into(),
        price,
        stock: 10,
        tag: tag.into(),
        ..Default::default()
    }
}

async fn seed_goods(repo: &GoodsRepository) {
    for (id, name, price, tag) in [
        (3, "apple", 30, "fruit"),
        (7, "pear", 10, "fruit"),
        (9, "plum", 20, "fruit"),
        (10, "leek", 5, "veg"),
    ] {
        repo.create(&mut goods(id, name, price, tag)).await.unwrap();
    }
}

#[tokio::test]
async fn test_find_default_returns_largest_primary_key() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();
    seed_goods(&repo).await;

    let probe = Goods {
        tag: "fruit".into(),
        ..Default::default()
    };
    let found = repo.find(&probe, Shape::Default).await.unwrap();
    assert_eq!(found.id, 9);
    assert_eq!(found.name, "plum");
    tdb.metrics()
        .assert_last("Goods", Operation::Find, Outcome::Success);
}

#[tokio::test]
async fn test_find_not_found_is_not_logged() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();
    seed_goods(&repo).await;

    let logs = LogCapture::new();
    let _guard = logs.install();

    let probe = Goods {
        tag: "meat".into(),
        ..Default::default()
    };
    let err = repo.find(&probe, Shape::Default).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(logs.errors().is_empty());
    tdb.metrics()
        .assert_last("Goods", Operation::Find, Outcome::NotFound);
    assert_eq!(tdb.metrics().count(Operation::Find, Outcome::NotFound), 1);
}

#[tokio::test]
async fn test_database_failure_is_logged() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();

    let logs = LogCapture::new();
    let _guard = logs.install();

    let err = repo
        .find_list_by_where("no_such_column = ?", &[1.into()], Shape::Default)
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Database(_)));

    let errors = logs.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("orm error"));
    assert!(errors[0].contains("Goods"));
    assert!(errors[0].contains("find_list_by_where"));
    tdb.metrics()
        .assert_last("Goods", Operation::FindListByWhere, Outcome::Error);
}

#[tokio::test]
async fn test_create_duplicate_key_is_logged_with_input() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();
    seed_goods(&repo).await;

    let logs = LogCapture::new();
    let _guard = logs.install();

    let err = repo.create(&mut goods(3, "quince", 40, "fruit")).await.unwrap_err();
    assert!(matches!(err, DataError::Database(_)));

    let errors = logs.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("orm error"));
    assert!(errors[0].contains("Goods"));
    assert!(errors[0].contains("create"));
    assert!(errors[0].contains("quince"));
    tdb.metrics()
        .assert_last("Goods", Operation::Create, Outcome::Error);
}

#[tokio::test]
async fn test_save_failure_is_logged_with_input() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();
    seed_goods(&repo).await;
    let probe = Goods {
        id: 10,
        ..Default::default()
    };
    let mut leek = repo.find(&probe, Shape::Default).await.unwrap();
    tdb.execute("DROP TABLE goods").await;

    let logs = LogCapture::new();
    let _guard = logs.install();

    leek.set_price(6);
    let err = repo.save(&mut leek).await.unwrap_err();
    assert!(matches!(err, DataError::Database(_)));

    let errors = logs.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("save"));
    assert!(errors[0].contains("leek"));
    tdb.metrics()
        .assert_last("Goods", Operation::Save, Outcome::Error);
}

#[tokio::test]
async fn test_successful_create_records_metric_without_error_log() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();

    let logs = LogCapture::new();
    let _guard = logs.install();

    repo.create(&mut goods(0, "fig", 3, "fruit")).await.unwrap();

    assert!(logs.errors().is_empty());
    assert!(!logs.contains("orm error"));
    tdb.metrics()
        .assert_last("Goods", Operation::Create, Outcome::Success);
    assert_eq!(tdb.metrics().count(Operation::Create, Outcome::Success), 1);
}

#[tokio::test]
async fn test_invalid_map_key_is_a_query_error() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();

    let filter = filter_map! { "name = 'x' OR 1" => 1 };
    let err = repo.find_by_map(&filter, Shape::Default).await.unwrap_err();
    assert!(matches!(err, DataError::Query(_)));
    tdb.metrics()
        .assert_last("Goods", Operation::FindByMap, Outcome::Error);
}

#[tokio::test]
async fn test_create_then_find_round_trip() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();

    let mut created = goods(0, "melon", 99, "fruit");
    created.set_stock(4);
    let affected = repo.create(&mut created).await.unwrap();
    assert_eq!(affected, 1);
    assert!(created.id > 0);
    assert!(created.changes().is_empty());

    let probe = Goods {
        id: created.id,
        ..Default::default()
    };
    let found = repo.find(&probe, Shape::Default).await.unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn test_save_writes_only_changed_columns() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();
    seed_goods(&repo).await;

    let probe = Goods {
        id: 7,
        ..Default::default()
    };
    let mut pear = repo.find(&probe, Shape::Default).await.unwrap();
    pear.set_price(12);
    pear.stock = 0;
    assert_eq!(repo.save(&mut pear).await.unwrap(), 1);
    assert!(pear.changes().is_empty());

    let reloaded = repo.find(&probe, Shape::Default).await.unwrap();
    assert_eq!(reloaded.price, 12);
    assert_eq!(reloaded.stock, 10);
}

#[tokio::test]
async fn test_save_without_changes_is_noop() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();
    seed_goods(&repo).await;

    let mut apple = repo
        .find_by_where("name = ?", &["apple".into()], Shape::Default)
        .await
        .unwrap();
    assert_eq!(repo.save(&mut apple).await.unwrap(), 0);
    tdb.metrics()
        .assert_last("Goods", Operation::Save, Outcome::Success);
}

#[tokio::test]
async fn test_find_list_by_primary_keys_skips_missing() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();
    seed_goods(&repo).await;

    let mut found = repo
        .find_list_by_primary_keys(&[3.into(), 9.into(), 404.into()])
        .await
        .unwrap();
    found.sort_by_key(|g| g.id);
    let ids: Vec<i64> = found.iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![3, 9]);

    assert!(repo.find_list_by_primary_keys(&[]).await.unwrap().is_empty());
    assert_eq!(
        tdb.metrics()
            .count(Operation::FindListByPrimaryKeys, Outcome::Success),
        2
    );
}

#[tokio::test]
async fn test_find_list_filters() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();
    seed_goods(&repo).await;

    let probe = Goods {
        tag: "fruit".into(),
        ..Default::default()
    };
    assert_eq!(repo.find_list(&probe, Shape::Default).await.unwrap().len(), 3);

    let cheap = repo
        .find_list_by_where("price < ? AND tag <> 'n/a?'", &[25.into()], Shape::Default)
        .await
        .unwrap();
    assert_eq!(cheap.len(), 3);

    let filter = filter_map! { "tag" => "veg", "price" => 5 };
    let veg = repo.find_list_by_map(&filter, Shape::Default).await.unwrap();
    assert_eq!(veg.len(), 1);
    assert_eq!(veg[0].name, "leek");

    let all = repo.find_list_by_where("", &[], Shape::Default).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn test_pager_pages_and_total() {
    let tdb = setup().await;
    let repo = tdb.repository::<Cart>();
    for n in 1..=10 {
        let mut cart = Cart {
            user_id: 1,
            goods_id: n,
            num: 1,
            ..Default::default()
        };
        repo.create(&mut cart).await.unwrap();
    }
    let mut other = Cart {
        user_id: 2,
        goods_id: 1,
        num: 1,
        ..Default::default()
    };
    repo.create(&mut other).await.unwrap();

    let filter = filter_map! { "user_id" => 1 };
    let mut pager = Pager::desc("id", &[]).set_page(2, 3);
    let page = repo
        .find_list_by_map(&filter, (&mut pager).into())
        .await
        .unwrap();
    let ids: Vec<i64> = page.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![7, 6, 5]);
    assert_eq!(pager.total_page(), 4);

    let mut last = Pager::desc("id", &[]).set_page(4, 3);
    let page = repo
        .find_list_by_map(&filter, (&mut last).into())
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, 1);

    let mut unpaged = Pager::asc("goods_id", &["id"]).set_page(0, 3);
    let all = repo
        .find_list_by_map(&filter, (&mut unpaged).into())
        .await
        .unwrap();
    assert_eq!(all.len(), 10);
    assert_eq!(all[0].goods_id, 1);
    assert_eq!(unpaged.total_page(), 0);
}

#[tokio::test]
async fn test_find_with_custom_pager_takes_first_row() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();
    seed_goods(&repo).await;

    let mut pager = Pager::asc("price", &[]);
    let probe = Goods {
        tag: "fruit".into(),
        ..Default::default()
    };
    let cheapest = repo.find(&probe, (&mut pager).into()).await.unwrap();
    assert_eq!(cheapest.name, "pear");
}

#[tokio::test]
async fn test_null_map_value_matches_is_null() {
    let tdb = setup().await;
    let repo = tdb.repository::<OrderLog>();
    let mut paid = OrderLog {
        order_no: "A1".into(),
        status: "paid".into(),
        ..Default::default()
    };
    repo.create(&mut paid).await.unwrap();
    let mut shipped = OrderLog {
        order_no: "A1".into(),
        status: "shipped".into(),
        remark: Some("express".into()),
        ..Default::default()
    };
    repo.create(&mut shipped).await.unwrap();

    let filter = filter_map! { "order_no" => "A1", "remark" => Value::Null };
    let found = repo.find_by_map(&filter, Shape::Default).await.unwrap();
    assert_eq!(found.status, "paid");
    assert_eq!(found.remark, None);
}

#[tokio::test]
async fn test_reserved_table_name() {
    let tdb = setup().await;
    let repo = tdb.repository::<Order>();
    let mut order = Order {
        order_no: "B7".into(),
        user_id: 3,
        total_price: 4200,
        status: "created".into(),
        ..Default::default()
    };
    repo.create(&mut order).await.unwrap();

    order.set_status("paid".into());
    repo.save(&mut order).await.unwrap();

    let filter = filter_map! { "order_no" => "B7" };
    let found = repo.find_by_map(&filter, Shape::Default).await.unwrap();
    assert_eq!(found.status, "paid");
    assert_eq!(found.total_price, 4200);
}

#[tokio::test]
async fn test_concurrent_calls_share_the_pool() {
    let tdb = setup().await;
    let repo: GoodsRepository = tdb.repository();
    seed_goods(&repo).await;
    let other = repo.clone();

    let fruit = Goods {
        tag: "fruit".into(),
        ..Default::default()
    };
    let keys = [Value::from(10)];
    let (a, b) = tokio::join!(
        repo.find_list(&fruit, Shape::Default),
        other.find_list_by_primary_keys(&keys)
    );
    assert_eq!(a.unwrap().len(), 3);
    assert_eq!(b.unwrap().len(), 1);
}

#[tokio::test]
async fn test_prometheus_sink() {
    let tdb = setup().await;
    let metrics = Arc::new(PrometheusMetrics::new(&MetricsConfig::default()).unwrap());
    let db: Database = tdb.db().clone().with_metrics(metrics.clone());
    let repo: GoodsRepository = db.repository();

    let probe = Goods {
        id: 1,
        ..Default::default()
    };
    assert!(repo.find(&probe, Shape::Default).await.unwrap_err().is_not_found());
    repo.create(&mut goods(0, "fig", 3, "fruit")).await.unwrap();

    assert_eq!(metrics.count("Goods", Operation::Find, Outcome::NotFound), 1);
    assert_eq!(metrics.count("Goods", Operation::Create, Outcome::Success), 1);
    let text = metrics.encode().unwrap();
    assert!(text.contains(r#"orm_request_duration_seconds_count{method="create",model="Goods"} 1"#));
}
