//! Repository tests against a real PostgreSQL database.
//!
//! They run only when DATABASE_URL points at a scratch database; the
//! migrations are applied first. Rows are keyed by a per-run suffix so the
//! tests can share one database.

use chrono::Utc;
use sqlx::postgres::PgPoolOptions;

use inventory_server::{
    audit::{AuditDraft, AuditExtra},
    models::{
        CreatePeripheral, HistoryQuery, Item, ItemForm, Operation, Operator, Peripheral,
        PeripheralStatus,
    },
    repository::{HistoryStore, ItemStore, PeripheralStore, Repository, UserStore},
    validation::validated,
};

async fn repository() -> Option<Repository> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping repository test");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Some(Repository::new(pool))
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn operator(repo: &Repository) -> Operator {
    let user = repo
        .create_user(&unique("op"), "not-a-hash", None, false)
        .await
        .unwrap();
    Operator {
        id: user.id,
        login: user.login,
    }
}

fn draft(operation: Operation, operator: &Operator) -> AuditDraft {
    AuditDraft::new(operation, operator.clone(), AuditExtra::default())
}

async fn create_hd(repo: &Repository, operator: &Operator, identificador: &str) -> Item {
    let form = ItemForm {
        tipo: Some("HD".to_string()),
        brand: Some("Seagate".to_string()),
        model: Some("Barracuda".to_string()),
        identificador: Some(identificador.to_string()),
        nota_fiscal: Some("NF-1001".to_string()),
        revenda: Some("Revalle Petrolina".to_string()),
        fornecedor: Some("Kabum".to_string()),
        date_registered: Some(Utc::now()),
        storage: Some("2TB".to_string()),
        ..Default::default()
    };
    let new_item = validated(form).unwrap();
    let (item, _) = repo
        .create_item(&new_item, &draft(Operation::Cadastro, operator))
        .await
        .unwrap();
    item
}

async fn attached_mouse(repo: &Repository, operator: &Operator, item: &Item) -> Peripheral {
    let data = CreatePeripheral {
        tipo: "Mouse".to_string(),
        brand: Some("Logitech".to_string()),
        identificador: Some(unique("MS")),
        ..Default::default()
    };
    let (peripheral, _) = repo
        .create_peripheral(&data, &draft(Operation::CadastroPeriferico, operator))
        .await
        .unwrap();
    repo.attach_peripheral(item.id, peripheral.id, &draft(Operation::VinculoPeriferico, operator))
        .await
        .unwrap();
    let peripheral = repo.get_peripheral(peripheral.id).await.unwrap();
    assert_eq!(peripheral.status, PeripheralStatus::EmUso);
    peripheral
}

async fn assert_released(repo: &Repository, operator: &Operator, peripheral: &Peripheral) {
    let peripheral = repo.get_peripheral(peripheral.id).await.unwrap();
    assert_eq!(peripheral.status, PeripheralStatus::Disponivel);
    assert!(repo.items_linked_to(peripheral.id).await.unwrap().is_empty());

    let query = HistoryQuery {
        peripheral_id: Some(peripheral.id),
        operation: Some(Operation::DesvinculoPeriferico),
        ..Default::default()
    };
    assert_eq!(repo.list_history(&query).await.unwrap().len(), 1);

    // no longer stuck: it can be deleted
    repo.deactivate_peripheral(peripheral.id, &draft(Operation::Exclusao, operator))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_soft_deleted_item_leaves_listing() {
    let Some(repo) = repository().await else { return };
    let operator = operator(&repo).await;
    let item = create_hd(&repo, &operator, &unique("IT-DEL")).await;
    assert!(repo.list_items().await.unwrap().iter().any(|i| i.id == item.id));

    let history = repo
        .deactivate_item(item.id, &draft(Operation::Exclusao, &operator))
        .await
        .unwrap();
    assert_eq!(history.item_id, Some(item.id));

    assert!(repo.list_items().await.unwrap().iter().all(|i| i.id != item.id));
    assert!(!repo.get_item(item.id).await.unwrap().is_active);
}

#[tokio::test]
async fn test_purge_keeps_history_snapshot() {
    let Some(repo) = repository().await else { return };
    let operator = operator(&repo).await;
    let identificador = unique("IT-PURGE");
    let item = create_hd(&repo, &operator, &identificador).await;
    let cadastro = repo.list_history(&HistoryQuery::for_item(item.id)).await.unwrap();
    assert_eq!(cadastro.len(), 1);

    let exclusao = repo
        .purge_item(item.id, &draft(Operation::Exclusao, &operator))
        .await
        .unwrap();
    assert_eq!(exclusao.item_id, None);
    assert_eq!(exclusao.identificador.as_deref(), Some(identificador.as_str()));

    assert!(repo.get_item(item.id).await.is_err());
    let entry = repo.get_history(cadastro[0].id).await.unwrap();
    assert_eq!(entry.item_id, None);
    assert_eq!(entry.operation, Operation::Cadastro);
    assert_eq!(entry.identificador.as_deref(), Some(identificador.as_str()));
    assert_eq!(entry.brand.as_deref(), Some("Seagate"));
}

#[tokio::test]
async fn test_soft_delete_releases_attached_peripherals() {
    let Some(repo) = repository().await else { return };
    let operator = operator(&repo).await;
    let item = create_hd(&repo, &operator, &unique("IT-DEL-PER")).await;
    let mouse = attached_mouse(&repo, &operator, &item).await;

    repo.deactivate_item(item.id, &draft(Operation::Exclusao, &operator))
        .await
        .unwrap();

    assert_released(&repo, &operator, &mouse).await;
}

#[tokio::test]
async fn test_purge_releases_attached_peripherals() {
    let Some(repo) = repository().await else { return };
    let operator = operator(&repo).await;
    let item = create_hd(&repo, &operator, &unique("IT-PURGE-PER")).await;
    let mouse = attached_mouse(&repo, &operator, &item).await;

    repo.purge_item(item.id, &draft(Operation::Exclusao, &operator))
        .await
        .unwrap();

    assert_released(&repo, &operator, &mouse).await;
}

#[tokio::test]
async fn test_peripheral_shared_with_another_item_stays_in_use() {
    let Some(repo) = repository().await else { return };
    let operator = operator(&repo).await;
    let first = create_hd(&repo, &operator, &unique("IT-SHARE-A")).await;
    let second = create_hd(&repo, &operator, &unique("IT-SHARE-B")).await;
    let mouse = attached_mouse(&repo, &operator, &first).await;
    repo.attach_peripheral(second.id, mouse.id, &draft(Operation::VinculoPeriferico, &operator))
        .await
        .unwrap();

    repo.deactivate_item(first.id, &draft(Operation::Exclusao, &operator))
        .await
        .unwrap();

    let mouse = repo.get_peripheral(mouse.id).await.unwrap();
    assert_eq!(mouse.status, PeripheralStatus::EmUso);
    assert_eq!(repo.items_linked_to(mouse.id).await.unwrap(), vec![second.id]);
}
