mod common;

#[test]
fn test_generate_simple_csv() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("generated.csv");
    common::generate_csv(&output_path, 2, 5).expect("Failed to generate CSV");

    let content = std::fs::read_to_string(&output_path).expect("Failed to read file");
    // Header + 2 creates + 2 deposits + 5 transfers
    assert_eq!(content.lines().count(), 10);
}

#[test]
fn test_generated_transfers_never_self_target() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("generated.csv");
    common::generate_csv(&output_path, 3, 30).expect("Failed to generate CSV");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&output_path)
        .expect("Failed to open CSV");

    let mut transfers = 0;
    for result in reader.records() {
        let record = result.expect("Failed to read record");
        if &record[0] == "transfer" {
            assert_ne!(&record[2], &record[3]);
            transfers += 1;
        }
    }
    assert_eq!(transfers, 30);
}
