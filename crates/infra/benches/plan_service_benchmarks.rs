use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;

use eduplan_billing::{BillableId, Course, Environment, Invoice, InvoiceId, PlanId, from_preset};
use eduplan_core::EntityId;
use eduplan_events::{EventEnvelope, InMemoryEventBus};
use eduplan_infra::{InMemoryBillingStore, PlanService};

type Service =
    PlanService<Arc<InMemoryBillingStore>, Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>>;

fn setup() -> (Service, Arc<InMemoryBillingStore>) {
    let store = Arc::new(InMemoryBillingStore::new());
    let bus = Arc::new(InMemoryEventBus::new());
    (PlanService::new(store.clone(), bus), store)
}

fn create_plan(service: &Service) -> PlanId {
    service
        .create_plan(from_preset("professor_standard", "PackagePlan"))
        .unwrap()
        .id_typed()
}

fn course(i: usize) -> Course {
    Course {
        id: BillableId::new(EntityId::new()),
        name: format!("Course {i}"),
        path: format!("course-{i}"),
        environment_id: None,
        workload: Some(10),
        published: true,
        created_at: Utc::now(),
    }
}

fn bench_transition_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition_latency");
    group.sample_size(1000);

    group.bench_function("block_then_activate", |b| {
        let (service, _) = setup();
        let plan_id = create_plan(&service);

        b.iter(|| {
            black_box(service.block(plan_id).unwrap());
            black_box(service.activate(plan_id).unwrap());
        });
    });

    group.bench_function("rejected_transition", |b| {
        let (service, _) = setup();
        let plan_id = create_plan(&service);
        service.migrate(plan_id).unwrap();

        b.iter(|| {
            black_box(service.block(plan_id).unwrap_err());
        });
    });

    group.finish();
}

fn bench_current_invoice_reassignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("current_invoice_reassignment");

    for invoice_count in [1usize, 12, 120].iter() {
        group.throughput(Throughput::Elements(*invoice_count as u64));
        group.bench_with_input(
            BenchmarkId::new("rotate_current", invoice_count),
            invoice_count,
            |b, &count| {
                let (service, _) = setup();
                let plan_id = create_plan(&service);
                let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
                let ids: Vec<InvoiceId> = (0..count)
                    .map(|i| {
                        let period_start = start + chrono::Days::new(30 * i as u64);
                        let invoice = Invoice::new(
                            InvoiceId::new(EntityId::new()),
                            period_start,
                            period_start + chrono::Days::new(29),
                            dec!(29.99),
                        )
                        .unwrap();
                        service.record_invoice(plan_id, invoice).unwrap().id_typed()
                    })
                    .collect();

                let mut next = 0;
                b.iter(|| {
                    let id = ids[next % ids.len()];
                    next += 1;
                    black_box(service.set_current_invoice(plan_id, Some(id)).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_environment_audit(c: &mut Criterion) {
    let mut group = c.benchmark_group("environment_audit");

    for course_count in [0usize, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("audit_billable", course_count),
            course_count,
            |b, &count| {
                let (service, store) = setup();
                let reference = store
                    .insert_billable(Environment {
                        id: BillableId::new(EntityId::new()),
                        name: "Bench Environment".to_string(),
                        path: "bench".to_string(),
                        initials: None,
                        created_at: Utc::now(),
                        courses: (0..count).map(course).collect(),
                        partner_environment_association: None,
                    })
                    .unwrap();
                let plan_id = service
                    .create_plan(from_preset("licensed_plus", "LicensedPlan").with_billable(reference))
                    .unwrap()
                    .id_typed();

                b.iter(|| {
                    black_box(service.audit_billable(plan_id).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_transition_latency,
    bench_current_invoice_reassignment,
    bench_environment_audit
);
criterion_main!(benches);
