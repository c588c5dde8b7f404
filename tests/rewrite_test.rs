//! Identification header rewrite tests

mod common;

use std::io::Cursor;

use common::*;
use oggdemux::rewrite::{multiply_sample_rate, rewrite_identification_headers};
use oggdemux::{inspect, Error, OggReader};

fn rewrite(input: &[u8], multiplier: f64) -> Vec<u8> {
    let mut reader = OggReader::new(Cursor::new(input.to_vec()));
    let mut output = Vec::new();
    let summary = multiply_sample_rate(&mut reader, &mut output, multiplier).unwrap();
    assert_eq!(summary.headers_rewritten, 1);
    assert_eq!(summary.pages_written, 3);
    output
}

#[test]
fn test_doubles_sample_rate() {
    let input = simple_stream(0x77, 22050, 44100).concat();
    let output = rewrite(&input, 2.0);

    let mut reader = OggReader::new(Cursor::new(output));
    let durations = inspect::read_durations(&mut reader).unwrap();
    assert_eq!(durations[0].sample_rate, Some(44100));
    assert_eq!(durations[0].duration_secs, Some(1.0));
}

#[test]
fn test_only_sample_rate_bytes_change() {
    let input = simple_stream(0x77, 44100, 0).concat();
    let output = rewrite(&input, 0.5);
    assert_eq!(output.len(), input.len());

    // Sample rate sits 12 bytes into the identification packet at offset 28
    let changed: Vec<usize> = (0..input.len()).filter(|&i| input[i] != output[i]).collect();
    assert!(!changed.is_empty());
    assert!(changed.iter().all(|&i| (40..44).contains(&i)));
    assert_eq!(&output[40..44], &22050u32.to_le_bytes());
}

#[test]
fn test_multiplier_truncates() {
    let input = simple_stream(1, 44100, 0).concat();
    let output = rewrite(&input, 0.7);
    let mut reader = OggReader::new(Cursor::new(output));
    let durations = inspect::read_durations(&mut reader).unwrap();
    assert_eq!(durations[0].sample_rate, Some(30869));
}

#[test]
fn test_every_stream_is_rewritten() {
    let a = simple_stream(1, 8000, 0);
    let b = simple_stream(2, 16000, 0);
    let input = [a[0].clone(), b[0].clone(), a[1].clone(), b[1].clone()].concat();

    let mut reader = OggReader::new(Cursor::new(input));
    let mut output = Vec::new();
    let summary = rewrite_identification_headers(&mut reader, &mut output, |header| {
        header.with_sample_rate(header.sample_rate + 1)
    })
    .unwrap();
    assert_eq!(summary.headers_rewritten, 2);
    assert_eq!(summary.pages_written, 4);

    let mut reader = OggReader::new(Cursor::new(output));
    let rates: Vec<Option<u32>> = inspect::read_durations(&mut reader)
        .unwrap()
        .into_iter()
        .map(|d| d.sample_rate)
        .collect();
    assert_eq!(rates, vec![Some(8001), Some(16001)]);
}

#[test]
fn test_malformed_input_aborts() {
    let mut input = simple_stream(1, 44100, 0).concat();
    input[4] = 3;
    let mut reader = OggReader::new(Cursor::new(input));
    let mut output = Vec::new();
    let err = multiply_sample_rate(&mut reader, &mut output, 2.0).unwrap_err();
    assert!(matches!(err, Error::MalformedHeader { offset: 0, .. }));
    assert!(output.is_empty());
}
