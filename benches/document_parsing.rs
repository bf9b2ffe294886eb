//! Document Parsing Benchmarks
//!
//! Throughput of the extraction stages and the tokenizer.
//!
//! Run with: `cargo bench --bench document_parsing`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use wordstream_server::document::{RawPage, TextRun};
use wordstream_server::formats::epub::extract_epub;
use wordstream_server::formats::pdf::mupdf::MuPdfPageSource;
use wordstream_server::formats::pdf::{extract_from_source, process_pages, LayoutConfig};
use wordstream_server::formats::txt;
use wordstream_server::tokenizer::tokenize_paragraphs;

/// Single-page PDF with one line of Helvetica text
fn create_minimal_pdf() -> Vec<u8> {
    let content = "BT /F1 12 Tf 72 720 Td (Benchmark text for the PDF layout pipeline.) Tj ET\n";
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [4 0 R] /Count 1 >>".to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 3 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}endstream", content.len(), content),
    ];

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, object).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    out
}

/// Minimal valid EPUB (ZIP with required structure)
fn create_minimal_epub() -> Vec<u8> {
    use std::io::{Cursor, Write};
    use zip::{write::SimpleFileOptions, ZipWriter};

    let mut buffer = Vec::new();
    {
        let cursor = Cursor::new(&mut buffer);
        let mut zip = ZipWriter::new(cursor);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        zip.start_file("mimetype", options).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        zip.start_file("META-INF/container.xml", options).unwrap();
        zip.write_all(br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#).unwrap();

        zip.start_file("OEBPS/content.opf", options).unwrap();
        zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">benchmark-epub-001</dc:identifier>
    <dc:title>Benchmark EPUB</dc:title>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="chapter1" href="chapter1.xhtml" media-type="application/xhtml+xml"/>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
  </manifest>
  <spine>
    <itemref idref="chapter1"/>
  </spine>
</package>"#).unwrap();

        zip.start_file("OEBPS/chapter1.xhtml", options).unwrap();
        zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Chapter 1</title></head>
<body>
<h1>Chapter 1</h1>
<p>This is a benchmark chapter for testing EPUB parsing performance.</p>
</body>
</html>"#).unwrap();

        zip.start_file("OEBPS/nav.xhtml", options).unwrap();
        zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Navigation</title></head>
<body>
<nav epub:type="toc">
<ol><li><a href="chapter1.xhtml">Chapter 1</a></li></ol>
</nav>
</body>
</html>"#).unwrap();

        zip.finish().unwrap();
    }
    buffer
}

/// Synthetic two-column pages with a running header and page numbers
fn create_layout_pages(count: usize) -> Vec<RawPage> {
    (1..=count)
        .map(|n| {
            let mut runs = vec![
                TextRun::new("Proceedings of the Benchmark Society", 200.0, 30.0, 9.0),
                TextRun::new(format!("- {} -", n), 295.0, 780.0, 9.0),
            ];
            for line in 0..40 {
                let y = 80.0 + line as f32 * 14.0;
                runs.push(TextRun::new(format!("left column line {} of page {}", line, n), 50.0, y, 10.0));
                runs.push(TextRun::new(format!("right column line {} of page {}", line, n), 320.0, y, 10.0));
            }
            RawPage {
                page_number: n,
                width: 612.0,
                height: 792.0,
                runs,
            }
        })
        .collect()
}

fn bench_pdf_parsing(c: &mut Criterion) {
    let pdf_data = create_minimal_pdf();
    let pdf_size = pdf_data.len();
    let config = LayoutConfig::default();

    let mut group = c.benchmark_group("pdf_parsing");
    group.throughput(Throughput::Bytes(pdf_size as u64));
    group.measurement_time(Duration::from_secs(10));

    group.bench_with_input(BenchmarkId::new("minimal_pdf", pdf_size), &pdf_data, |b, data| {
        b.iter(|| {
            let mut source = MuPdfPageSource::open(black_box(data.as_slice()))
                .expect("Failed to open PDF");
            black_box(extract_from_source(&mut source, &config).expect("Failed to extract PDF"))
        })
    });

    group.finish();
}

fn bench_pdf_layout(c: &mut Criterion) {
    let config = LayoutConfig::default();
    let mut group = c.benchmark_group("pdf_layout");

    for count in [10usize, 100] {
        let pages = create_layout_pages(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("process_pages", count), &pages, |b, pages| {
            b.iter(|| black_box(process_pages(pages.clone(), &config)))
        });
    }

    group.finish();
}

fn bench_epub_parsing(c: &mut Criterion) {
    let epub_data = create_minimal_epub();
    let epub_size = epub_data.len();

    let mut group = c.benchmark_group("epub_parsing");
    group.throughput(Throughput::Bytes(epub_size as u64));
    group.measurement_time(Duration::from_secs(10));

    group.bench_with_input(BenchmarkId::new("minimal_epub", epub_size), &epub_data, |b, data| {
        b.iter(|| black_box(extract_epub(black_box(data.clone())).expect("Failed to parse EPUB")))
    });

    group.finish();
}

fn bench_tokenizer(c: &mut Criterion) {
    let sentence = "It was the best of times, it was the worst of times; prices rose 12.5% to $1,299.99! ";
    let text: String = (0..500)
        .map(|i| if i % 10 == 9 { format!("{}\n\n", sentence) } else { sentence.to_string() })
        .collect();

    let mut group = c.benchmark_group("tokenizer");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("split_and_tokenize", |b| {
        b.iter(|| {
            let mut paragraphs = txt::split_paragraphs(black_box(&text));
            black_box(tokenize_paragraphs(&mut paragraphs, None))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_pdf_parsing,
    bench_pdf_layout,
    bench_epub_parsing,
    bench_tokenizer
);
criterion_main!(benches);
