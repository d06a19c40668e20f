#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, DbErr};
use sea_orm_migration::prelude::*;
use serde_json::{Value, json};
use serverside_datatable::{
    ColumnSpec, DataTableEndpoint, DataTablesError, EntityView, MemoryView, Row, connect_sqlite,
    datatable_router,
};

pub mod person_entity;

/// (first_name, last_name, score, internal_id)
pub const PEOPLE: [(&str, &str, Option<i32>, i32); 3] = [
    ("John", "Smith", Some(7), 1),
    ("Matt", "Henry", Some(9), 2),
    ("Alice", "Jones", None, 3),
];

pub const PEOPLE_COLUMNS: [&str; 3] = ["id", "first_name", "last_name"];

/// Route library logs to the test output; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = connect_sqlite("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Insert one person; ids are assigned in insertion order
pub async fn insert_person(
    db: &DatabaseConnection,
    first_name: &str,
    last_name: &str,
    score: Option<i32>,
    internal_id: i32,
) -> Result<person_entity::Model, DbErr> {
    person_entity::ActiveModel {
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        score: Set(score),
        internal_id: Set(internal_id),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Database with [`PEOPLE`] inserted in order, ids 1..=3
pub async fn setup_seeded_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;
    for (first_name, last_name, score, internal_id) in PEOPLE {
        insert_person(&db, first_name, last_name, score, internal_id).await?;
    }
    Ok(db)
}

/// The same rows as [`PEOPLE`], as JSON
pub fn people_rows() -> Vec<Row> {
    PEOPLE
        .iter()
        .zip(1..)
        .map(|((first_name, last_name, score, internal_id), id)| {
            match json!({
                "id": id,
                "first_name": first_name,
                "last_name": last_name,
                "score": score,
                "internal_id": internal_id,
            }) {
                Value::Object(row) => row,
                _ => unreachable!(),
            }
        })
        .collect()
}

/// Encode columns `[0..]` for the given data keys
pub fn columns_query(data: &[&str]) -> String {
    data.iter()
        .enumerate()
        .map(|(i, data)| format!("columns[{i}][data]={data}&columns[{i}][name]={data}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub struct PeopleTable {
    pub db: DatabaseConnection,
}

#[async_trait]
impl DataTableEndpoint for PeopleTable {
    type View = EntityView<person_entity::Entity>;

    fn columns(&self) -> ColumnSpec {
        ColumnSpec::new(PEOPLE_COLUMNS)
    }

    async fn data_view(&self) -> Result<Self::View, DataTablesError> {
        Ok(EntityView::from_entity(self.db.clone()))
    }
}

pub struct MemoryPeopleTable;

#[async_trait]
impl DataTableEndpoint for MemoryPeopleTable {
    type View = MemoryView;

    fn columns(&self) -> ColumnSpec {
        ColumnSpec::new(PEOPLE_COLUMNS)
    }

    async fn data_view(&self) -> Result<Self::View, DataTablesError> {
        Ok(MemoryView::new(people_rows()))
    }
}

/// Endpoint that never configured a data source
pub struct UnconfiguredTable;

#[async_trait]
impl DataTableEndpoint for UnconfiguredTable {
    type View = MemoryView;

    fn columns(&self) -> ColumnSpec {
        ColumnSpec::new(PEOPLE_COLUMNS)
    }
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .merge(datatable_router("/people", PeopleTable { db }))
        .merge(datatable_router("/memory-people", MemoryPeopleTable))
        .merge(datatable_router("/unconfigured", UnconfiguredTable));

    Router::new().nest("/api/v1", api)
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreatePeopleTable)]
    }
}

pub struct CreatePeopleTable;

impl MigrationName for CreatePeopleTable {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_people_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreatePeopleTable {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(People::Table)
            .if_not_exists()
            .col(
                ColumnDef::new(People::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(People::FirstName).string().not_null())
            .col(ColumnDef::new(People::LastName).string().not_null())
            .col(ColumnDef::new(People::Score).integer().null())
            .col(ColumnDef::new(People::InternalId).integer().not_null())
            .to_owned();

        manager.create_table(table).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(People::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum People {
    Table,
    Id,
    FirstName,
    LastName,
    Score,
    InternalId,
}
