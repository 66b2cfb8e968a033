// Performance benchmarks for loading and joining similarity tables
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use vitrine_core::{load_catalog_from_reader, Catalog, DuplicatePolicy, LoadOptions, ProductRecord};

fn generate_table(rows: usize) -> String {
    let mut rng = rand::rng();
    let mut csv = String::from(
        ",image_name,PROD_REF,DES_CONC,Color,Sizes,Price,\
         similar_image_1,similarity_score_1,similar_image_2,similarity_score_2,\
         similar_image_3,similarity_score_3,similar_image_4,similarity_score_4\n",
    );
    for i in 0..rows {
        csv.push_str(&format!(
            "{i},img_{i:06},{}.0,product number {i},Black,U,{:.2}",
            100_000 + i,
            rng.random_range(5.0f64..120.0)
        ));
        for _ in 0..4 {
            // a few neighbours point outside the table
            let target = rng.random_range(0..rows + rows / 20);
            csv.push_str(&format!(",img_{:06},{:.4}", target, rng.random_range(0.5f32..1.0)));
        }
        csv.push('\n');
    }
    csv
}

fn generate_catalog(rows: usize) -> Catalog {
    let mut rng = rand::rng();
    let products = (0..rows)
        .map(|i| {
            let mut product = ProductRecord::new(format!("img_{:06}", i))
                .with_prod_ref(format!("{}", 100_000 + i))
                .with_description(format!("product number {}", i));
            for slot in 1..=4 {
                let target = rng.random_range(0..rows);
                product = product.with_neighbour(slot, format!("img_{:06}", target), Some(rng.random_range(0.5f32..1.0)));
            }
            product
        })
        .collect();
    Catalog::from_records(products, DuplicatePolicy::Warn).unwrap()
}

fn benchmark_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for size in [1_000, 10_000, 50_000].iter() {
        let table = generate_table(*size);
        group.bench_with_input(BenchmarkId::new("csv", size), &table, |b, table| {
            b.iter(|| {
                let catalog = load_catalog_from_reader(table.as_bytes(), LoadOptions::default()).unwrap();
                black_box(catalog.len())
            });
        });
    }

    group.finish();
}

fn benchmark_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_neighbours");

    for size in [1_000, 10_000, 50_000].iter() {
        let catalog = generate_catalog(*size);
        let keys: Vec<String> = catalog.iter().map(|p| p.image_name.clone()).collect();
        let mut rng = rand::rng();

        group.bench_with_input(BenchmarkId::new("random_product", size), size, |b, _| {
            b.iter(|| {
                let key = &keys[rng.random_range(0..keys.len())];
                let product = catalog.get(key).unwrap();
                black_box(catalog.resolve_neighbours(product).len())
            });
        });
    }

    group.finish();
}

fn benchmark_search(c: &mut Criterion) {
    let catalog = generate_catalog(10_000);

    c.bench_function("search_labels_10k", |b| {
        b.iter(|| black_box(catalog.search(black_box("number 42")).len()));
    });
}

criterion_group!(benches, benchmark_load, benchmark_resolve, benchmark_search);
criterion_main!(benches);
