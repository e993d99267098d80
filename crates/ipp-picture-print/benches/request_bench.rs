// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for request building, conversion to the `ipp` wire
// model, and job naming.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ipp::prelude::Uri;

use ipp_picture_core::message::{PrintMeta, WhichJobs};
use ipp_picture_print::dispatch;
use ipp_picture_print::job_name::jpeg_job_name;
use ipp_picture_print::transport::{from_ipp_response, to_ipp_request};

/// A 1 MiB buffer that starts with a JPEG SOI marker.
fn jpeg_buffer() -> Vec<u8> {
    let mut buf = vec![0u8; 1024 * 1024];
    buf[0] = 0xFF;
    buf[1] = 0xD8;
    buf
}

fn bench_get_jobs(c: &mut Criterion) {
    let uri: Uri = "http://192.168.1.100:631/ipp/print".parse().expect("uri");
    c.bench_function("get_jobs_to_ipp_request", |b| {
        b.iter(|| {
            let request = dispatch::get_jobs(black_box(WhichJobs::NotCompleted));
            black_box(to_ipp_request(&uri, request))
        })
    });
}

fn bench_decode(c: &mut Criterion) {
    let uri: Uri = "http://192.168.1.100:631/ipp/print".parse().expect("uri");
    let wire = to_ipp_request(&uri, dispatch::get_jobs(WhichJobs::Completed));
    c.bench_function("decode_attribute_groups", |b| {
        b.iter(|| black_box(from_ipp_response(black_box(&wire))))
    });
}

fn bench_print_jpeg(c: &mut Criterion) {
    let buffer = jpeg_buffer();
    let meta = PrintMeta::default();
    c.bench_function("print_jpeg_request_1mib", |b| {
        b.iter(|| {
            black_box(
                dispatch::print_jpeg(black_box(&buffer), &meta, Some("holiday"), "ipp-picture")
                    .expect("request"),
            )
        })
    });
}

fn bench_job_name(c: &mut Criterion) {
    c.bench_function("jpeg_job_name", |b| {
        b.iter(|| black_box(jpeg_job_name(black_box(Some("TESTER")))))
    });
}

criterion_group!(
    benches,
    bench_get_jobs,
    bench_decode,
    bench_print_jpeg,
    bench_job_name
);
criterion_main!(benches);
