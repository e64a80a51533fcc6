use criterion::{black_box, criterion_group, criterion_main, Criterion};
use smartcards_api::models::{Receipt, ReceiptItem, SpendingBreakdown};
use smartcards_api::services::vision::parse_line_items;

/// A long, messy model answer: list markers, currency symbols, noise lines.
fn sample_answer(lines: usize) -> String {
    let mut answer = String::from("Here are the items on the receipt:\n\n");
    for i in 0..lines {
        match i % 4 {
            0 => answer.push_str(&format!("- Item {}: ${}.{:02}\n", i, i % 20, i % 100)),
            1 => answer.push_str(&format!("**Item {}**: {}.99\n", i, i % 9)),
            2 => answer.push_str(&format!("Item {} (2 @ 1.50): 3.00\n", i)),
            _ => answer.push_str("Thank you for shopping!\n"),
        }
    }
    answer.push_str("Subtotal: 1,234.56\nTax: 12.34\n");
    answer
}

fn benchmark_parse_line_items(c: &mut Criterion) {
    let short = sample_answer(20);
    let long = sample_answer(500);

    let mut group = c.benchmark_group("parse_line_items");

    group.bench_function("typical_receipt", |b| {
        b.iter(|| parse_line_items(black_box(&short)))
    });

    group.bench_function("very_long_receipt", |b| {
        b.iter(|| parse_line_items(black_box(&long)))
    });

    group.finish();
}

fn benchmark_breakdown(c: &mut Criterion) {
    let categories = ["Groceries", "Household", "Dining", "Personal Care", "Snacks"];
    let receipts: Vec<Receipt> = (0..100)
        .map(|r| {
            let items = (0..30)
                .map(|i| ReceiptItem {
                    name: format!("Item {}", i),
                    price: (i as f64) * 0.37,
                    category: categories[(r + i) % categories.len()].to_string(),
                })
                .collect();
            Receipt::new(format!("{}.jpg", r), String::new(), items, 1.0, String::new())
        })
        .collect();

    c.bench_function("breakdown_100_receipts", |b| {
        b.iter(|| SpendingBreakdown::from_receipts(black_box(&receipts)))
    });
}

criterion_group!(benches, benchmark_parse_line_items, benchmark_breakdown);
criterion_main!(benches);
