use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use slowlog_poke::fingerprint::fingerprint;
use slowlog_poke::{FieldRuleEngine, SlowlogParser, for_each_record};

const SINGLE_RECORD: &str = "# Time: 2024-01-01T00:00:10.000000Z\n\
# User@Host: app[app] @ localhost []  Id:     7\n\
# Query_time: 2.000000  Lock_time: 0.000100 Rows_sent: 1  Rows_examined: 10\n\
SET timestamp=1704067210;\n\
SELECT 1 FROM x;\n";

/// 生成测试数据
fn generate_test_data(record_count: usize) -> String {
    let mut data = String::with_capacity(record_count * 260);
    for i in 0..record_count {
        data.push_str(&format!(
            "# Time: 2024-01-01T00:{:02}:{:02}.{:06}Z\n\
             # User@Host: user{}[user{}] @ app{} []  Id: {}\n\
             # Query_time: 0.{:06}  Lock_time: 0.000010 Rows_sent: {}  Rows_examined: {}\n\
             SET timestamp=1704067200;\n\
             SELECT o.id, c.name FROM orders o JOIN customers{} c ON c.id = o.customer_id WHERE o.id = {};\n",
            (i / 60) % 60,
            i % 60,
            i % 1_000_000,
            i % 100,
            i % 100,
            i % 10,
            i,
            i % 1_000_000,
            i % 50,
            i * 10,
            i % 20,
            i
        ));
    }
    data
}

fn bench_single_record(c: &mut Criterion) {
    let engine = FieldRuleEngine::mysql_default().unwrap();

    c.bench_function("single_record", |b| {
        b.iter(|| {
            let records: Vec<_> = SlowlogParser::new(black_box(SINGLE_RECORD.as_bytes()), &engine)
                .collect();
            records
        })
    });
}

fn bench_for_each_record(c: &mut Criterion) {
    let engine = FieldRuleEngine::mysql_default().unwrap();
    let mut group = c.benchmark_group("for_each_record");

    for count in [100, 1_000, 10_000] {
        let data = generate_test_data(count);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| {
                let mut emitted = 0usize;
                for_each_record(black_box(data.as_bytes()), &engine, |_| {
                    emitted += 1;
                    Ok(())
                })
                .unwrap();
                emitted
            })
        });
    }

    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let query = "SELECT o.id, c.name FROM orders o JOIN customers c ON c.id = o.customer_id \
                 WHERE o.state IN ('paid', 'shipped', 'done') AND o.total > 10.5 LIMIT 10, 20";

    c.bench_function("fingerprint", |b| b.iter(|| fingerprint(black_box(query))));
}

criterion_group!(benches, bench_single_record, bench_for_each_record, bench_fingerprint);
criterion_main!(benches);
