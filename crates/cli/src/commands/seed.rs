//! Seed a snapshot data directory with the starter data set.
//!
//! Idempotent-ish by collection: a collection that already has records is
//! left alone, so re-running against a live data directory never clobbers
//! edits made through the backoffice.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pedidoflex_core::{
    Address, BillingEntity, Currency, Email, EntityId, Money, NewsPost, PostId, Product,
    ProductId, TaxId,
};
use pedidoflex_portal::persist::{DocumentStore, SnapshotStore, collections};
use pedidoflex_portal::stores::{BillingEntityStore, CatalogStore, NewsStore};
use rust_decimal::Decimal;

/// Write the starter catalog, entities, and news into `data_dir`.
pub async fn run(data_dir: &str) -> Result<(), Box<dyn std::error::Error>> {
    let persist: Arc<SnapshotStore> = Arc::new(SnapshotStore::new(data_dir));

    seed_catalog(Arc::clone(&persist)).await?;
    seed_entities(Arc::clone(&persist)).await?;
    seed_news(persist).await?;

    tracing::info!(data_dir, "seed complete");
    Ok(())
}

async fn seed_catalog(persist: Arc<SnapshotStore>) -> Result<(), Box<dyn std::error::Error>> {
    if !persist.load_all(collections::PRODUCTS).await?.is_empty() {
        tracing::info!("products already present, skipping");
        return Ok(());
    }

    let catalog = CatalogStore::new(persist);
    // Reverse order so the first product here lands first in the display.
    for product in starter_products().into_iter().rev() {
        catalog.upsert(product).await?;
    }
    tracing::info!("catalog seeded");
    Ok(())
}

async fn seed_entities(persist: Arc<SnapshotStore>) -> Result<(), Box<dyn std::error::Error>> {
    if !persist.load_all(collections::ENTITIES).await?.is_empty() {
        tracing::info!("entities already present, skipping");
        return Ok(());
    }

    let entities = BillingEntityStore::new(persist);
    for entity in starter_entities()?.into_iter().rev() {
        entities.upsert(entity).await?;
    }
    tracing::info!("billing entities seeded");
    Ok(())
}

async fn seed_news(persist: Arc<SnapshotStore>) -> Result<(), Box<dyn std::error::Error>> {
    if !persist.load_all(collections::NEWS).await?.is_empty() {
        tracing::info!("news already present, skipping");
        return Ok(());
    }

    let news = NewsStore::new(persist);
    for post in starter_news()?.into_iter().rev() {
        news.upsert(post).await?;
    }
    tracing::info!("news seeded");
    Ok(())
}

fn starter_products() -> Vec<Product> {
    let brl = |cents: i64| Money::new(Decimal::new(cents, 2), Currency::Brl);
    let product = |id: &str, name: &str, price: Money, stock: u32, category: &str| Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        unit_price: price,
        stock,
        image_url: format!("https://cdn.pedidoflex.com.br/produtos/{id}.jpg"),
        category: category.to_owned(),
    };

    vec![
        product("1", "Suco Natural Integral 1L", brl(12_50), 150, "Bebidas"),
        product("2", "Barra de Cereal Eco 12un", brl(45_90), 80, "Snacks"),
        product("3", "Granola Artesanal 500g", brl(22_00), 45, "Grãos"),
        product("4", "Água Mineral 500ml", brl(2_50), 1000, "Bebidas"),
        product("5", "Chips de Batata Doce 100g", brl(8_50), 120, "Snacks"),
        product("6", "Mix de Castanhas 200g", brl(18_90), 60, "Snacks"),
    ]
}

fn starter_entities() -> Result<Vec<BillingEntity>, Box<dyn std::error::Error>> {
    Ok(vec![
        BillingEntity {
            id: EntityId::new("c1"),
            name: "Lanches Mirante".to_owned(),
            legal_name: Some("Mirante Alimentos LTDA".to_owned()),
            tax_number: TaxId::parse("11.222.333/0001-81")?,
            responsible_cpf: Some(TaxId::parse("123.456.789-09")?),
            distributor: "Distribuidora Norte".to_owned(),
            contact_email: Some(Email::parse("financeiro@lanchesmirante.com.br")?),
            phone: Some("11999998888".to_owned()),
            address: Some(Address {
                postal_code: "01310-100".to_owned(),
                street: "Avenida Paulista".to_owned(),
                number: "1000".to_owned(),
                district: "Bela Vista".to_owned(),
                city: "São Paulo".to_owned(),
                state: "SP".to_owned(),
                complement: None,
            }),
        },
        BillingEntity {
            id: EntityId::new("c2"),
            name: "Empório Niklaus".to_owned(),
            legal_name: None,
            tax_number: TaxId::parse("98.765.432/0001-98")?,
            responsible_cpf: None,
            distributor: "Distribuidora Sul".to_owned(),
            contact_email: None,
            phone: None,
            address: None,
        },
        BillingEntity {
            id: EntityId::new("c3"),
            name: "Vicente e Valentim".to_owned(),
            legal_name: None,
            tax_number: TaxId::parse("11.444.777/0001-61")?,
            responsible_cpf: None,
            distributor: "Distribuidora Norte".to_owned(),
            contact_email: None,
            phone: None,
            address: None,
        },
    ])
}

fn starter_news() -> Result<Vec<NewsPost>, Box<dyn std::error::Error>> {
    let date = |s: &str| -> Result<DateTime<Utc>, chrono::ParseError> { s.parse() };
    Ok(vec![
        NewsPost {
            id: PostId::new("n1"),
            title: "Lançamento: Nova linha de orgânicos".to_owned(),
            body: "Chegaram os novos sucos orgânicos certificados para o catálogo B2B. \
                   Consulte as condições especiais para pedidos acima de 50 caixas."
                .to_owned(),
            date: date("2025-06-25T09:00:00Z")?,
            image_url: Some("https://cdn.pedidoflex.com.br/news/organicos.jpg".to_owned()),
        },
        NewsPost {
            id: PostId::new("n2"),
            title: "Aviso: Alteração de frete".to_owned(),
            body: "A partir de agosto teremos novas tabelas de frete para a região Sul, \
                   otimizando o tempo de entrega para 48h."
                .to_owned(),
            date: date("2025-06-24T09:00:00Z")?,
            image_url: None,
        },
    ])
}
