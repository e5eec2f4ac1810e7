//! # Seed Data Generator
//!
//! Populates a development database with a realistic colmado inventory:
//! suppliers, shelf products across the usual categories, and a handful of
//! regular customers.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p colmado-db --bin seed
//!
//! # Specify database path
//! cargo run -p colmado-db --bin seed -- --db ./data/colmado.db
//! ```
//!
//! Seeding is skipped when the database already has products, so it is safe
//! to run repeatedly.

use std::env;

use colmado_db::{Database, DbConfig};

use colmado_core::{ItbisRate, NewParty, NewProduct};

/// (name, category, purchase price, sale price before ITBIS, rate, stock)
///
/// Basic foodstuffs (rice, beans, milk, eggs, plantains) are ITBIS-exempt
/// under Dominican law; processed goods carry the standard 18%.
const PRODUCTS: &[(&str, &str, f64, f64, ItbisRate, f64)] = &[
    ("Arroz Selecto 5lb", "Granos", 180.0, 235.0, ItbisRate::Exempt, 40.0),
    ("Habichuelas Rojas 1lb", "Granos", 55.0, 75.0, ItbisRate::Exempt, 60.0),
    ("Azúcar Crema 1lb", "Granos", 28.0, 40.0, ItbisRate::Exempt, 80.0),
    ("Plátano Verde (unidad)", "Víveres", 10.0, 15.0, ItbisRate::Exempt, 120.0),
    ("Yuca (lb)", "Víveres", 14.0, 22.0, ItbisRate::Exempt, 45.0),
    ("Huevos (cartón 30)", "Lácteos", 150.0, 195.0, ItbisRate::Exempt, 25.0),
    ("Leche Evaporada Carnation", "Lácteos", 48.0, 62.0, ItbisRate::Standard, 50.0),
    ("Queso de Freír (lb)", "Lácteos", 140.0, 190.0, ItbisRate::Standard, 18.0),
    ("Salami Superior 1lb", "Embutidos", 120.0, 175.0, ItbisRate::Standard, 22.0),
    ("Salchichón Induveca", "Embutidos", 75.0, 110.0, ItbisRate::Standard, 30.0),
    ("Aceite Crisol 1L", "Despensa", 175.0, 230.0, ItbisRate::Standard, 35.0),
    ("Pasta de Tomate Baldom", "Despensa", 30.0, 45.0, ItbisRate::Standard, 70.0),
    ("Café Santo Domingo 1lb", "Despensa", 210.0, 285.0, ItbisRate::Reduced, 28.0),
    ("Refresco Rojo 2L", "Bebidas", 70.0, 100.0, ItbisRate::Standard, 48.0),
    ("Agua Planeta Azul 1gal", "Bebidas", 35.0, 55.0, ItbisRate::Exempt, 60.0),
    ("Cerveza Presidente Grande", "Bebidas", 130.0, 200.0, ItbisRate::Standard, 36.0),
    ("Ron Barceló Pequeño", "Bebidas", 250.0, 380.0, ItbisRate::Higher, 12.0),
    ("Jabón de Cuaba Candado", "Limpieza", 32.0, 50.0, ItbisRate::Standard, 55.0),
    ("Cloro Magia Blanca 1L", "Limpieza", 40.0, 65.0, ItbisRate::Standard, 40.0),
    ("Pan Sobao (unidad)", "Panadería", 6.0, 10.0, ItbisRate::Exempt, 90.0),
];

const SUPPLIERS: &[(&str, &str, &str)] = &[
    ("Distribuidora Corripio", "809-555-2001", "Av. Máximo Gómez, Santo Domingo"),
    ("Induveca S.A.", "809-555-2002", "Zona Industrial de Haina"),
    ("Mercado Nuevo Mayorista", "809-555-2003", "Av. Duarte, Santo Domingo"),
];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Doña María Altagracia", "809-555-1001", "Calle Duarte #12"),
    ("Ramón El Mecánico", "829-555-1002", "Calle Sánchez #3"),
    ("Carmen Rosario", "849-555-1003", "Av. Libertad #45"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./colmado_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Colmado POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./colmado_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Colmado POS Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding suppliers...");
    let mut supplier_ids = Vec::new();
    for (name, phone, address) in SUPPLIERS {
        let supplier = db
            .suppliers()
            .register(&NewParty {
                name: name.to_string(),
                phone: phone.to_string(),
                address: address.to_string(),
            })
            .await?;
        supplier_ids.push(supplier.id);
    }
    println!("  {} suppliers", supplier_ids.len());

    println!("Seeding products...");
    let start = std::time::Instant::now();
    for (idx, (name, category, purchase, price, rate, stock)) in PRODUCTS.iter().enumerate() {
        let input = NewProduct {
            name: name.to_string(),
            description: String::new(),
            purchase_price: *purchase,
            price_excl_itbis: *price,
            itbis_applies: !rate.is_zero(),
            itbis_rate: *rate,
            stock: *stock,
            category: Some(category.to_string()),
            supplier_id: Some(supplier_ids[idx % supplier_ids.len()]),
        };
        if let Err(e) = db.products().register(&input).await {
            eprintln!("Failed to insert {}: {}", name, e);
        }
    }
    println!("  {} products in {:?}", PRODUCTS.len(), start.elapsed());

    println!("Seeding customers...");
    for (name, phone, address) in CUSTOMERS {
        db.customers()
            .register(&NewParty {
                name: name.to_string(),
                phone: phone.to_string(),
                address: address.to_string(),
            })
            .await?;
    }
    println!("  {} customers", CUSTOMERS.len());

    println!();
    let sellable = db.products().list_sellable().await?;
    println!("✓ Sellable catalog: {} products", sellable.len());
    println!("✓ Seed complete!");

    Ok(())
}
