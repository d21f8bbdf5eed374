//! The in-memory and relational backends must agree on content for the same
//! sequence of operations.

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use rstest::rstest;

use ayak_api::{
    entities::{InquiryType, QuoteStatus},
    errors::ServiceError,
    models::{NewCategory, NewInquiry, NewProduct, NewQuoteItem, ProductFilter},
    storage::{BackendKind, Storage},
};
use common::{storage_for, Backend};

/// Everything but ids and timestamps.
#[derive(Debug, PartialEq)]
struct QuoteShape {
    user_id: Option<String>,
    status: QuoteStatus,
    items: Vec<(String, i32, Option<String>)>,
}

async fn catalog(storage: &dyn Storage) -> (i32, i32) {
    let chairs = storage
        .create_category(NewCategory::new("Office Chairs", "office-chairs"))
        .await
        .unwrap();
    let mut chair = NewProduct::new(
        "ErgoOne Task Chair",
        "Mesh back with lumbar support",
        "https://img.example/chair.jpg",
    );
    chair.category_id = Some(chairs.id);
    chair.price = Some(1_500_000);
    let chair = storage.create_product(chair).await.unwrap();

    let desk = storage
        .create_product(NewProduct::new(
            "Executive Desk Elite",
            "Walnut veneer",
            "https://img.example/desk.jpg",
        ))
        .await
        .unwrap();
    (chair.id, desk.id)
}

async fn quote_shapes(storage: &dyn Storage, user: &str) -> Vec<QuoteShape> {
    let mut shapes = Vec::new();
    for quote in storage.get_quotes(user).await.unwrap() {
        let mut items = Vec::new();
        for item in storage.get_quote_items(quote.id).await.unwrap() {
            let product = storage.get_product(item.product_id).await.unwrap().unwrap();
            items.push((product.name, item.quantity, item.customization_notes));
        }
        shapes.push(QuoteShape {
            user_id: quote.user_id,
            status: quote.status,
            items,
        });
    }
    shapes
}

#[rstest]
#[case::memory(Backend::Memory, BackendKind::Memory)]
#[case::sqlite(Backend::Sqlite, BackendKind::Database)]
#[tokio::test]
async fn reports_its_kind(#[case] backend: Backend, #[case] expected: BackendKind) {
    let storage = storage_for(backend).await;
    assert_eq!(storage.kind(), expected);
}

#[tokio::test]
async fn same_operations_same_content() {
    let memory = storage_for(Backend::Memory).await;
    let sqlite = storage_for(Backend::Sqlite).await;

    let mut results = Vec::new();
    for storage in [&memory, &sqlite] {
        let (chair, desk) = catalog(storage.as_ref()).await;
        storage
            .create_quote(Some("user1"), &[NewQuoteItem::new(chair, 2)])
            .await
            .unwrap();
        storage
            .create_quote(
                Some("user1"),
                &[
                    NewQuoteItem::new(desk, 1).with_notes("cable tray"),
                    NewQuoteItem {
                        product_id: chair,
                        quantity: None,
                        customization_notes: None,
                    },
                ],
            )
            .await
            .unwrap();
        storage
            .create_quote(Some("user2"), &[NewQuoteItem::new(desk, 5)])
            .await
            .unwrap();
        results.push(quote_shapes(storage.as_ref(), "user1").await);
    }

    assert_eq!(results[0], results[1]);
    let expected = vec![
        QuoteShape {
            user_id: Some("user1".into()),
            status: QuoteStatus::Pending,
            items: vec![
                ("Executive Desk Elite".into(), 1, Some("cable tray".into())),
                ("ErgoOne Task Chair".into(), 1, None),
            ],
        },
        QuoteShape {
            user_id: Some("user1".into()),
            status: QuoteStatus::Pending,
            items: vec![("ErgoOne Task Chair".into(), 2, None)],
        },
    ];
    assert_eq!(results[0], expected);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn single_quote_is_pending(#[case] backend: Backend) {
    let storage = storage_for(backend).await;
    let (chair, _) = catalog(storage.as_ref()).await;

    storage
        .create_quote(Some("user1"), &[NewQuoteItem::new(chair, 2)])
        .await
        .unwrap();
    let quotes = storage.get_quotes("user1").await.unwrap();
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].status, QuoteStatus::Pending);
    assert!(storage.get_quotes("nobody").await.unwrap().is_empty());
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn dangling_references_are_rejected(#[case] backend: Backend) {
    let storage = storage_for(backend).await;
    let (chair, _) = catalog(storage.as_ref()).await;

    let err = storage
        .create_quote(
            Some("user1"),
            &[NewQuoteItem::new(chair, 1), NewQuoteItem::new(5_000, 2)],
        )
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::ValidationError(msg)
            if msg == "items: productId does not reference an existing product"
    );
    assert!(storage.get_quotes("user1").await.unwrap().is_empty());

    let mut orphan = NewProduct::new("Lounge Sofa", "Three-seater", "https://img.example/s.jpg");
    orphan.category_id = Some(5_000);
    let err = storage.create_product(orphan).await.unwrap_err();
    assert_matches!(
        err,
        ServiceError::ValidationError(msg)
            if msg == "categoryId does not reference an existing category"
    );
    let products = storage.get_products(&ProductFilter::default()).await.unwrap();
    assert_eq!(products.len(), 2);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn category_lookup_and_slug_conflict(#[case] backend: Backend) {
    let storage = storage_for(backend).await;
    let created = storage
        .create_category(NewCategory::new("Sofas", "sofas").with_image("https://img.example/s.jpg"))
        .await
        .unwrap();

    let by_slug = storage.get_category_by_slug("sofas").await.unwrap();
    assert_eq!(by_slug.as_ref(), Some(&created));
    assert_eq!(storage.get_category(created.id).await.unwrap(), Some(created));
    assert!(storage.get_category_by_slug("tables").await.unwrap().is_none());

    let err = storage
        .create_category(NewCategory::new("Sofas again", "sofas"))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(msg) if msg == "category slug 'sofas' already exists");
    assert_eq!(storage.get_categories().await.unwrap().len(), 1);
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn product_filters_agree(#[case] backend: Backend) {
    let storage = storage_for(backend).await;
    let (chair, desk) = catalog(storage.as_ref()).await;
    let percent = storage
        .create_product(NewProduct::new("Promo 50% Bench", "Sale", "https://img.example/b.jpg"))
        .await
        .unwrap();

    let names = |products: Vec<ayak_api::entities::Product>| -> Vec<i32> {
        products.into_iter().map(|p| p.id).collect()
    };

    let all = storage.get_products(&ProductFilter::default()).await.unwrap();
    assert_eq!(names(all), vec![chair, desk, percent.id]);

    let chair_row = storage.get_product(chair).await.unwrap().unwrap();
    let in_category = storage
        .get_products(&ProductFilter::by_category(chair_row.category_id.unwrap()))
        .await
        .unwrap();
    assert_eq!(names(in_category), vec![chair]);

    let search = |term: &str| ProductFilter {
        category_id: None,
        search: Some(term.to_string()),
    };
    assert_eq!(
        names(storage.get_products(&search("WALNUT")).await.unwrap()),
        vec![desk]
    );
    assert_eq!(
        names(storage.get_products(&search("50%")).await.unwrap()),
        vec![percent.id]
    );
    assert!(storage
        .get_products(&search("%"))
        .await
        .unwrap()
        .iter()
        .all(|p| p.name.contains('%')));

    // Mixed-case ASCII folds everywhere; non-ASCII text matches as typed.
    let shelf = storage
        .create_product(NewProduct::new(
            "Oak étagère",
            "Open SHELVING unit",
            "https://img.example/e.jpg",
        ))
        .await
        .unwrap();
    assert_eq!(
        names(storage.get_products(&search("Shelving")).await.unwrap()),
        vec![shelf.id]
    );
    assert_eq!(
        names(storage.get_products(&search("étagère")).await.unwrap()),
        vec![shelf.id]
    );
}

#[rstest]
#[case::memory(Backend::Memory)]
#[case::sqlite(Backend::Sqlite)]
#[tokio::test]
async fn inquiries_are_stored(#[case] backend: Backend) {
    let storage = storage_for(backend).await;
    let inquiry = storage
        .create_inquiry(NewInquiry {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            company: None,
            message: "Need 40 chairs".into(),
            inquiry_type: InquiryType::SolutionRequest,
        })
        .await
        .unwrap();
    assert_eq!(inquiry.inquiry_type, InquiryType::SolutionRequest);
    assert_eq!(inquiry.message, "Need 40 chairs");
}

#[tokio::test]
async fn concurrent_quotes_get_distinct_ids() {
    let storage: Arc<dyn Storage> = storage_for(Backend::Memory).await;
    let (chair, _) = catalog(storage.as_ref()).await;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let storage = Arc::clone(&storage);
            tokio::spawn(async move {
                storage
                    .create_quote(Some("user1"), &[NewQuoteItem::new(chair, 1)])
                    .await
                    .unwrap()
                    .id
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(storage.get_quotes("user1").await.unwrap().len(), 16);
}
