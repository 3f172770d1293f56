//! Demo catalog generator

use rand::Rng;
use rust_decimal::Decimal;
use tracing::warn;

use super::CatalogService;
use crate::domain::aggregates::ProductInput;

pub const BRANDS: [&str; 10] =
    ["Nike", "Adidas", "Puma", "Reebok", "New Balance", "Under Armour", "ASICS", "Converse", "Vans", "Skechers"];
pub const MODELS: [&str; 10] =
    ["Air Max", "Superstar", "RS-X", "Classic", "Fresh Foam", "Charged", "Gel-Nimbus", "Chuck Taylor", "Old Skool", "Go Walk"];
pub const MATERIALS: [&str; 10] =
    ["Leather", "Mesh", "Synthetic", "Canvas", "Knit", "Suede", "Textile", "Nylon", "Cotton", "Polyester"];
pub const CATEGORIES: [&str; 10] =
    ["Running", "Casual", "Sport", "Training", "Basketball", "Tennis", "Walking", "Skateboarding", "Lifestyle", "Gym"];
pub const COLORWAYS: [[&str; 2]; 10] = [
    ["White", "Black"], ["Black", "Red"], ["Navy", "White"], ["Grey", "Blue"], ["White", "Green"],
    ["Black", "Gold"], ["Red", "White"], ["Blue", "Grey"], ["Green", "Black"], ["Purple", "White"],
];
pub const FEATURES: [[&str; 3]; 10] = [
    ["Comfortable", "Durable", "Stylish"],
    ["Classic", "Comfortable", "Versatile"],
    ["Modern", "Lightweight", "Sporty"],
    ["Breathable", "Flexible", "Supportive"],
    ["Cushioned", "Stable", "Responsive"],
    ["Waterproof", "Grippy", "Protective"],
    ["Eco-friendly", "Recyclable", "Sustainable"],
    ["Slip-resistant", "Anti-odor", "Quick-dry"],
    ["Shock-absorbing", "Ventilated", "Balanced"],
    ["Memory foam", "Arch support", "Heel cushioning"],
];

fn pick<'a, T, R: Rng>(options: &'a [T], rng: &mut R) -> &'a T {
    &options[rng.gen_range(0..options.len())]
}

/// `count` generated shoes named "<brand> <model> <n>", numbered from 1.
/// Prices fall in 50.00..150.00, stock in 10..=100, sizes 36 through 44.
pub fn sample_products<R: Rng>(count: usize, rng: &mut R) -> Vec<ProductInput> {
    (1..=count)
        .map(|n| {
            let brand = *pick(&BRANDS, rng);
            let model = *pick(&MODELS, rng);
            let material = *pick(&MATERIALS, rng);
            let features = pick(&FEATURES, rng).join(", ");
            ProductInput {
                name: format!("{brand} {model} {n}"),
                brand: brand.to_string(),
                category: pick(&CATEGORIES, rng).to_string(),
                description: format!("{material} upper. {features}."),
                price: Decimal::new(rng.gen_range(5_000..15_000), 2),
                stock: rng.gen_range(10..=100),
                sizes: (36..=44).collect(),
                colors: pick(&COLORWAYS, rng).iter().map(|c| c.to_string()).collect(),
                images: Vec::new(),
            }
        })
        .collect()
}

/// Create every product through the catalog. Failures are logged and
/// skipped; returns how many were created.
pub async fn seed_catalog(catalog: &CatalogService, products: Vec<ProductInput>) -> usize {
    let mut created = 0;
    for input in products {
        let name = input.name.clone();
        match catalog.create_product(input).await {
            Ok(_) => created += 1,
            Err(e) => warn!(name = %name, error = %e, "failed to seed product"),
        }
    }
    created
}
