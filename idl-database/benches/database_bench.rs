use criterion::{black_box, criterion_group, criterion_main, Criterion};
use idl_database::{Annotations, Attribute, Database, ExtAttrs, FilterCriteria, IdlType, Interface, ParentInterface, RenameMap};

/// A chain of interfaces, every tenth one suppressed for Dart and every
/// seventh one referencing a type that does not exist
fn synthetic_database(size: usize) -> Database {
    let interfaces = (0..size).map(|i| {
        let mut interface = Interface::new(format!("Interface{}", i));
        interface.annotations = Annotations::with_namespaces(["WebKit"]);
        if i % 10 == 0 {
            interface.annotations.insert("Dart", "suppressed", "");
        }
        if i > 0 {
            interface.parents.push(ParentInterface {
                ty: IdlType::named(format!("Interface{}", i - 1)),
                annotations: Annotations::with_namespaces(["WebKit"]),
            });
        }
        for j in 0..8 {
            let ty = if j == 0 && i % 7 == 0 {
                IdlType::named("Missing")
            } else if j % 2 == 0 {
                IdlType::named("DOMString")
            } else {
                IdlType::sequence(IdlType::named(format!("Interface{}", (i + j) % size)))
            };
            interface.attributes.push(Attribute {
                id: format!("attribute{}", j),
                ty,
                readonly: j % 3 == 0,
                is_static: false,
                annotations: Annotations::with_namespaces(["WebKit"]),
                ext_attrs: ExtAttrs::new(),
            });
        }
        interface
    });
    Database::from_interfaces(interfaces.collect::<Vec<_>>())
}

fn benchmark_prune(c: &mut Criterion) {
    let database = synthetic_database(500);

    c.bench_function("prune_unresolved_members", |b| {
        b.iter(|| black_box(database.clone()).prune_unresolved_members())
    });
}

fn benchmark_filter(c: &mut Criterion) {
    let database = synthetic_database(500);
    let criteria = FilterCriteria::webkit_dart();

    c.bench_function("filter_webkit_dart", |b| {
        b.iter(|| black_box(database.clone()).filter(&criteria))
    });
}

fn benchmark_rename(c: &mut Criterion) {
    let database = synthetic_database(500);
    let renames = RenameMap::from_pairs((0..500).step_by(5).map(|i| (format!("Interface{}", i), format!("Renamed{}", i))))
        .unwrap();

    c.bench_function("rename", |b| {
        b.iter(|| black_box(database.clone()).rename(&renames, false).unwrap())
    });
}

criterion_group!(benches, benchmark_prune, benchmark_filter, benchmark_rename);
criterion_main!(benches);
