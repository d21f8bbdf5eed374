//! Idempotent catalog seeding.
//!
//! Categories are matched by slug and products by name, so running the seed
//! repeatedly (every startup, or via the `seed` subcommand) never duplicates
//! rows. A product whose category cannot be resolved is skipped.

use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use crate::{
    errors::ServiceError,
    models::{NewCategory, NewProduct, ProductFilter},
    storage::Storage,
};

/// What a seeding pass inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub categories_created: usize,
    pub products_created: usize,
    pub products_skipped: usize,
}

struct ProductSeed {
    name: &'static str,
    description: &'static str,
    price: i64,
    category_slug: &'static str,
    image_url: &'static str,
    specifications: &'static [(&'static str, &'static str)],
}

const CATEGORY_SEEDS: &[(&str, &str, &str)] = &[
    (
        "Workstations",
        "workstations",
        "https://www.officefurniturecenter.com/media/wysiwyg/components-of-a-workstaton.jpg",
    ),
    (
        "Office Chairs",
        "office-chairs",
        "https://cxl.com/wp-content/uploads/2023/09/Office-chair-1024x595.jpg",
    ),
    (
        "Executive & MD Furniture",
        "executive",
        "https://cdn.dribbble.com/userupload/32922234/file/original-02d0ac6da863f0278ae68bda9b65191c.png?format=webp&resize=400x300&vertical=center",
    ),
    (
        "Storage & Cabinets",
        "storage",
        "https://www.studiofoxdesign.com/wp-content/uploads/2021/12/Cube-1024x492.jpg",
    ),
    (
        "Conference & Reception",
        "conference",
        "https://cdn.dribbble.com/userupload/45293418/file/977134ef4c94cba16953b8d48aed4525.png?format=webp&resize=400x300&vertical=center",
    ),
    (
        "Sofas",
        "sofas",
        "https://www.ecomva.com/wp-content/uploads/2024/04/furniture-service-banner-1.png",
    ),
];

const PRODUCT_SEEDS: &[ProductSeed] = &[
    ProductSeed {
        name: "ErgoOne Task Chair",
        description:
            "High-performance ergonomic chair with mesh back and adjustable lumbar support.",
        price: 1_500_000,
        category_slug: "office-chairs",
        image_url: "https://cxl.com/wp-content/uploads/2023/09/Office-chair-1024x595.jpg",
        specifications: &[
            ("Backrest", "Mesh"),
            ("Base", "Nylon"),
            ("Warranty", "5 Years"),
        ],
    },
    ProductSeed {
        name: "Modular Workstation 4-Person",
        description: "Scalable workstation system designed for collaborative teams.",
        price: 4_500_000,
        category_slug: "workstations",
        image_url:
            "https://www.officefurniturecenter.com/media/wysiwyg/components-of-a-workstaton.jpg",
        specifications: &[
            ("Dimensions", "1200x600mm per seat"),
            ("Material", "Engineered Wood"),
        ],
    },
    ProductSeed {
        name: "Executive Desk Elite",
        description:
            "Premium executive desk with integrated cable management and leather pad.",
        price: 8_500_000,
        category_slug: "executive",
        image_url: "https://cdn.dribbble.com/userupload/32922234/file/original-02d0ac6da863f0278ae68bda9b65191c.png?format=webp&resize=400x300&vertical=center",
        specifications: &[("Finish", "Walnut Veneer"), ("Width", "1800mm")],
    },
];

impl ProductSeed {
    fn to_new_product(&self, category_id: i32) -> NewProduct {
        let specifications: BTreeMap<String, String> = self
            .specifications
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut product = NewProduct::new(self.name, self.description, self.image_url);
        product.price = Some(self.price);
        product.category_id = Some(category_id);
        product.is_customizable = true;
        product.specifications = Some(specifications);
        product
    }
}

/// Inserts any missing reference categories and sample products.
#[instrument(skip(storage), fields(backend = %storage.kind()))]
pub async fn seed_catalog(storage: &dyn Storage) -> Result<SeedReport, ServiceError> {
    let mut report = SeedReport::default();

    let existing = storage.get_categories().await?;
    for (name, slug, image) in CATEGORY_SEEDS {
        if existing.iter().any(|c| c.slug == *slug) {
            continue;
        }
        info!(slug, "seeding category");
        match storage
            .create_category(NewCategory::new(*name, *slug).with_image(*image))
            .await
        {
            Ok(_) => report.categories_created += 1,
            // Another seeding pass got there first.
            Err(ServiceError::Conflict(_)) => {}
            Err(err) => return Err(err),
        }
    }

    let categories = storage.get_categories().await?;
    let products = storage.get_products(&ProductFilter::default()).await?;

    for seed in PRODUCT_SEEDS {
        if products.iter().any(|p| p.name == seed.name) {
            continue;
        }
        let Some(category) = categories.iter().find(|c| c.slug == seed.category_slug) else {
            warn!(product = seed.name, slug = seed.category_slug, "category missing; product not seeded");
            report.products_skipped += 1;
            continue;
        };
        info!(product = seed.name, "seeding product");
        storage.create_product(seed.to_new_product(category.id)).await?;
        report.products_created += 1;
    }

    info!(?report, "catalog seeding completed");
    Ok(report)
}
