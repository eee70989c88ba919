use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lab_instruments::{
    freedom::parse_calibration_block,
    qred::{
        message::{BulkData, RequestWord},
        parser::decode_response,
        Spectrum,
    },
};
use utilities::{FREEDOM_CALIBRATION, QRED_SPECTRUM_RESPONSE};

fn bench_qred_spectrum(c: &mut Criterion) {
    let request = RequestWord::get(BulkData::Spectrum);
    let raw: &[u8] = &QRED_SPECTRUM_RESPONSE;
    c.bench_function("qred spectrum reply", |b| {
        b.iter(|| {
            let frame = decode_response(black_box(raw), request).unwrap();
            Spectrum::parse(frame.payload).unwrap()
        })
    });
}

fn bench_freedom_calibration(c: &mut Criterion) {
    let text: &str = &FREEDOM_CALIBRATION;
    c.bench_function("freedom calibration block", |b| {
        b.iter(|| parse_calibration_block(black_box(text)))
    });
}

criterion_group!(benches, bench_qred_spectrum, bench_freedom_calibration);
criterion_main!(benches);
