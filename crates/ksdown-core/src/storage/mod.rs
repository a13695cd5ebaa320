//! Destination files: pre-sizing and positional segment writes.
//!
//! Every call opens its own short-lived handle. Writers at disjoint offsets of
//! the same file need no coordination beyond what pwrite already gives.

mod prepare;
mod writer;

pub use prepare::prepare_destination;
pub use writer::write_segment;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presize_then_write_leaves_other_bytes_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.bin");

        prepare_destination(&path, 100).unwrap();
        std::fs::write(&path, vec![0xAAu8; 100]).unwrap();

        write_segment(&path, 40, b"0123456789").unwrap();

        let content = std::fs::read(&path).unwrap();
        assert_eq!(content.len(), 100);
        assert_eq!(&content[40..50], b"0123456789");
        assert!(content[..40].iter().all(|&b| b == 0xAA));
        assert!(content[50..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn concurrent_disjoint_writes_in_scrambled_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let body: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
        prepare_destination(&path, body.len() as u64).unwrap();

        let segments = crate::segmenter::partition(body.len() as u64, 8);
        let order = [5usize, 2, 7, 0, 3, 6, 1, 4];
        std::thread::scope(|s| {
            for &i in &order {
                let seg = segments[i];
                let path = &path;
                let chunk = &body[seg.start as usize..seg.end as usize];
                s.spawn(move || write_segment(path, seg.start, chunk).unwrap());
            }
        });

        assert_eq!(std::fs::read(&path).unwrap(), body);
    }
}
