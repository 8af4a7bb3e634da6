use super::*;
use crate::consts::CRLF;
use crate::factory;
use crate::models::{RecordInfo, RecordType};
use crate::writer::Warcinfo;
use crate::writer::tests::writer;
use harc_compress::Compression;
use rstest::rstest;
use sha2::{Digest, Sha256};
use std::io::Cursor;

/// A bootstrapped container holding two resources, plus the writer position
/// after each record.
fn container(compression: Compression) -> (Vec<u8>, Vec<u64>) {
    let mut writer = writer(compression).warcinfo(Warcinfo::from_lines(None, &["software: harc"]));
    let mut positions = Vec::new();
    writer.bootstrap("test-00000-20240101000000.warc.open").unwrap();
    positions.push(writer.position());
    writer
        .write_resource(RecordInfo::from_bytes(RecordType::Resource, &[b'a'; 500]).url("http://example.com/a"))
        .unwrap();
    positions.push(writer.position());
    writer
        .write_resource(RecordInfo::from_bytes(RecordType::Resource, &[b'b'; 300]).url("http://example.com/b"))
        .unwrap();
    positions.push(writer.position());
    (writer.into_inner().unwrap(), positions)
}

fn reader(bytes: Vec<u8>) -> WarcReader<Cursor<Vec<u8>>> {
    factory::from_stream("memory", Cursor::new(bytes)).unwrap()
}

/// Hands out at most one byte per read.
struct Trickle<R>(R);
impl<R: Read> Read for Trickle<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = buf.len().min(1);
        self.0.read(&mut buf[..len])
    }
}

#[rstest]
#[case(Compression::None)]
#[case(Compression::Gzip)]
fn reads_back_what_was_written(#[case] compression: Compression) {
    let (bytes, positions) = container(compression);
    let mut reader = reader(bytes);
    assert_eq!(reader.is_compressed(), compression.is_compressed());

    let mut records = Vec::new();
    while let Some(record) = reader.next_record().unwrap() {
        records.push(record.into_parts().unwrap());
    }
    assert_eq!(records.len(), 3);

    let (warcinfo, metadata) = &records[0];
    assert_eq!(warcinfo.record_type().unwrap(), RecordType::Warcinfo);
    assert_eq!(warcinfo.offset(), 0);
    assert_eq!(warcinfo.filename(), Some("test-00000-20240101000000.warc"));
    assert_eq!(warcinfo.content_length(), metadata.len() as u64);

    let (first, body) = &records[1];
    assert_eq!(first.record_type().unwrap(), RecordType::Resource);
    assert_eq!(first.url(), Some("http://example.com/a"));
    assert_eq!(first.offset(), positions[0]);
    assert_eq!(body, &vec![b'a'; 500]);

    let (second, body) = &records[2];
    assert_eq!(second.offset(), positions[1]);
    assert_eq!(second.content_length(), 300);
    assert_eq!(second.length(), 300 + second.header_length());
    assert_eq!(second.reader_identifier(), "memory");
    assert_eq!(body, &vec![b'b'; 300]);
}

#[test]
fn plain_offsets_follow_record_lengths() {
    let (bytes, _) = container(Compression::None);
    let headers = reader(bytes).validate(Some(3)).unwrap();
    for pair in headers.windows(2) {
        // CRLF before the body and two CRLF after it.
        assert_eq!(pair[1].offset(), pair[0].offset() + pair[0].length() + 4);
    }
}

#[test]
fn plain_offsets_after_empty_body() {
    let mut writer = writer(Compression::None);
    writer.write_metadata(RecordInfo::without_content(RecordType::Metadata).field("via", "test")).unwrap();
    writer.write_resource(RecordInfo::from_bytes(RecordType::Resource, b"x").url("http://x.test/")).unwrap();

    let headers = reader(writer.into_inner().unwrap()).validate(Some(2)).unwrap();
    assert_eq!(headers[0].content_length(), 0);
    assert_eq!(headers[0].length(), headers[0].header_length());
    // Only the second CRLF pair follows the header's blank line.
    assert_eq!(headers[1].offset(), headers[0].offset() + headers[0].length() + 2);
}

#[rstest]
#[case(Compression::None)]
#[case(Compression::Gzip)]
fn random_access_matches_sequential(#[case] compression: Compression) {
    let (bytes, _) = container(compression);
    let sequential = reader(bytes.clone()).validate(None).unwrap();

    let mut reader = reader(bytes);
    // Leave a record half read before seeking elsewhere.
    let mut open = reader.next_record().unwrap().unwrap();
    let mut buf = [0u8; 3];
    open.read_exact(&mut buf).unwrap();
    drop(open);

    for expected in sequential.iter().rev() {
        let header = reader.get(expected.offset()).unwrap().finish().unwrap();
        assert_eq!(&header, expected);
    }
    let (header, body) = reader.get(sequential[2].offset()).unwrap().into_parts().unwrap();
    assert_eq!(header.url(), Some("http://example.com/b"));
    assert_eq!(body.len(), 300);

    // Sequential reading resumes after the record that was fetched.
    assert!(reader.next_record().unwrap().is_none());
}

#[rstest]
#[case(Compression::None)]
#[case(Compression::Gzip)]
fn unread_bodies_are_skipped(#[case] compression: Compression) {
    let (bytes, _) = container(compression);
    let mut reader = reader(bytes);
    let mut urls = Vec::new();
    while let Some(mut record) = reader.next_record().unwrap() {
        let mut buf = [0u8; 7];
        let _ = record.read(&mut buf).unwrap();
        urls.push(record.header().url().map(str::to_string));
    }
    assert_eq!(urls, vec![None, Some("http://example.com/a".to_string()), Some("http://example.com/b".to_string())]);
}

#[rstest]
#[case(Compression::None)]
#[case(Compression::Gzip)]
fn records_without_body(#[case] compression: Compression) {
    let mut writer = writer(compression);
    writer.write_metadata(RecordInfo::without_content(RecordType::Metadata).field("outlink", "http://a.test/")).unwrap();
    writer.write_resource(RecordInfo::from_bytes(RecordType::Resource, b"after").url("http://b.test/")).unwrap();
    writer.write_metadata(RecordInfo::without_content(RecordType::Metadata).field("outlink", "http://c.test/")).unwrap();

    let headers = reader(writer.into_inner().unwrap()).validate(Some(3)).unwrap();
    assert_eq!(headers[0].content_length(), 0);
    assert_eq!(headers[0].field("outlink"), Some("http://a.test/"));
    assert_eq!(headers[1].url(), Some("http://b.test/"));
    assert_eq!(headers[2].field("outlink"), Some("http://c.test/"));
}

#[test]
fn plain_accepts_full_terminator_after_empty_body() {
    let mut first = writer(Compression::None);
    first.write_metadata(RecordInfo::without_content(RecordType::Metadata).field("via", "test")).unwrap();
    let mut bytes = first.into_inner().unwrap();
    // Blank line plus a complete terminator.
    bytes.extend_from_slice(CRLF);
    let second_start = bytes.len();
    let mut second = writer(Compression::None);
    second.write_resource(RecordInfo::from_bytes(RecordType::Resource, b"x").url("http://x.test/")).unwrap();
    bytes.extend_from_slice(&second.into_inner().unwrap());

    let headers = reader(bytes).validate(Some(2)).unwrap();
    assert_eq!(headers[1].offset(), second_start as u64);
}

#[test]
fn full_terminator_split_across_reads() {
    let mut first = writer(Compression::None);
    first.write_metadata(RecordInfo::without_content(RecordType::Metadata).field("via", "test")).unwrap();
    let mut bytes = first.into_inner().unwrap();
    bytes.extend_from_slice(CRLF);
    let mut second = writer(Compression::None);
    second.write_resource(RecordInfo::from_bytes(RecordType::Resource, b"x").url("http://x.test/")).unwrap();
    bytes.extend_from_slice(&second.into_inner().unwrap());

    let reader = WarcReader::Plain(PlainReader::new("memory", Trickle(Cursor::new(bytes))));
    let headers = reader.validate(Some(2)).unwrap();
    assert_eq!(headers[0].field("via"), Some("test"));
    assert_eq!(headers[1].url(), Some("http://x.test/"));
}

#[test]
fn stray_carriage_return_after_empty_body() {
    let mut first = writer(Compression::None);
    first.write_metadata(RecordInfo::without_content(RecordType::Metadata).field("via", "test")).unwrap();
    let mut bytes = first.into_inner().unwrap();
    bytes.extend_from_slice(b"\rWARC/1.0\r\n");

    let mut reader = PlainReader::new("memory", Trickle(Cursor::new(bytes)));
    reader.next_record().unwrap().unwrap();
    let err = reader.next_record().err().unwrap();
    assert!(matches!(*err, ErrorKind::MalformedContainer(_)));
}

#[rstest]
#[case(Compression::None)]
#[case(Compression::Gzip)]
fn digests_cover_the_whole_body(#[case] compression: Compression) {
    let (bytes, _) = container(compression);
    let expected = format!("sha256:{}", hex::encode(Sha256::digest([b'a'; 500])));

    let mut digesting = reader(bytes.clone()).with_digests(true);
    digesting.next_record().unwrap().unwrap().finish().unwrap();
    let mut record = digesting.next_record().unwrap().unwrap();
    let mut buf = [0u8; 100];
    record.read_exact(&mut buf).unwrap();
    assert_eq!(record.digest(), None);
    assert_eq!(record.remaining(), 400);
    let header = record.finish().unwrap();
    assert_eq!(header.digest(), Some(expected.as_str()));

    let mut plain = reader(bytes);
    plain.next_record().unwrap().unwrap().finish().unwrap();
    assert_eq!(plain.next_record().unwrap().unwrap().finish().unwrap().digest(), None);
}

#[test]
fn broken_terminator_is_fatal() {
    let (mut bytes, positions) = container(Compression::None);
    let end = positions[0] as usize;
    bytes[end - 4..end].copy_from_slice(b"XX\r\n");

    let mut reader = reader(bytes);
    reader.next_record().unwrap().unwrap();
    let err = reader.next_record().err().unwrap();
    assert!(matches!(*err, ErrorKind::MalformedContainer(_)));
}

#[test]
fn bad_magic_is_fatal() {
    let mut reader = PlainReader::new("memory", Cursor::new(b"WARX/1.0\r\nContent-Length: 0\r\n\r\n\r\n".to_vec()));
    let err = reader.next_record().err().unwrap();
    assert!(matches!(*err, ErrorKind::MalformedContainer(_)));
}

#[rstest]
#[case(Compression::None)]
#[case(Compression::Gzip)]
fn truncated_body(#[case] compression: Compression) {
    let (mut bytes, positions) = container(compression);
    bytes.truncate(positions[0] as usize + (positions[1] - positions[0]) as usize / 2);

    let mut reader = reader(bytes);
    reader.next_record().unwrap().unwrap().finish().unwrap();
    match reader.next_record() {
        // Plain input fails while reading the body.
        Ok(Some(record)) => {
            let err = record.into_parts().err().unwrap();
            assert!(matches!(*err, ErrorKind::MalformedContainer(_)));
        },
        // A truncated gzip member may already fail inside the header.
        Err(err) => assert!(err.is_fatal_for_reader()),
        Ok(None) => panic!("truncated record was silently skipped"),
    }
}

#[test]
fn stray_bytes_in_member_are_tolerated() {
    let mut plain = writer(Compression::None);
    plain.write_resource(RecordInfo::from_bytes(RecordType::Resource, b"first").url("http://a.test/")).unwrap();
    let mut record = plain.into_inner().unwrap();
    record.extend_from_slice(b"unexpected trailing bytes");
    let mut member = Compression::Gzip.member_encoder(Vec::new());
    member.write_all(&record).unwrap();
    let mut bytes = member.finish().unwrap();

    let mut compressed = writer(Compression::Gzip);
    compressed.write_resource(RecordInfo::from_bytes(RecordType::Resource, b"second").url("http://b.test/")).unwrap();
    bytes.extend_from_slice(&compressed.into_inner().unwrap());

    let headers = reader(bytes).validate(Some(2)).unwrap();
    assert_eq!(headers[0].url(), Some("http://a.test/"));
    assert_eq!(headers[1].url(), Some("http://b.test/"));
}

#[test]
fn validate_checks_record_count() {
    let (bytes, _) = container(Compression::Gzip);
    let err = reader(bytes).validate(Some(2)).err().unwrap();
    assert_eq!(*err, ErrorKind::RecordCount { expected: 2, actual: 3 });
}

#[test]
fn headers_iterator_stops_after_error() {
    let (mut bytes, positions) = container(Compression::None);
    let end = positions[0] as usize;
    bytes[end - 2..end].copy_from_slice(b"??");

    let results: Vec<_> = reader(bytes).headers().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[rstest]
#[case("/data/IAH-00001-20240101000000-host.warc.gz.open", "IAH-00001-20240101000000-host")]
#[case("crawl.warc", "crawl")]
#[case("memory", "memory")]
fn stripped_file_name(#[case] identifier: &str, #[case] expected: &str) {
    let (bytes, _) = container(Compression::None);
    let reader = factory::from_stream(identifier, Cursor::new(bytes)).unwrap();
    assert_eq!(reader.stripped_file_name(), expected);
}
