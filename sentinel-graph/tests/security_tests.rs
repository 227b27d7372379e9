use sentinel_graph::transactions::analyze_query;
use sentinel_graph::TransactionType;

#[test]
fn query_analysis_detects_delete_as_write() {
    let delete_query = "match $u isa user-account, has id \"user-eve\"; delete $u;";
    let analysis = analyze_query(delete_query);

    assert!(matches!(analysis.transaction_type, TransactionType::Write));
    assert_eq!(analysis.primary_type.as_str(), "match");
}

#[test]
fn query_analysis_detects_insert_as_write() {
    let insert_query = "insert $u isa user-account, has id \"new-user\";";
    let analysis = analyze_query(insert_query);

    assert!(matches!(analysis.transaction_type, TransactionType::Write));
    assert_eq!(analysis.primary_type.as_str(), "insert");
}

#[test]
fn query_analysis_allows_plain_match_as_read() {
    let read_query = "match $u isa user-account; limit 10;";
    let analysis = analyze_query(read_query);

    assert!(matches!(analysis.transaction_type, TransactionType::Read));
    assert_eq!(analysis.primary_type.as_str(), "match");
}

#[test]
fn query_analysis_detects_define_as_schema() {
    let schema_query = "define user-account sub entity, has id;";
    let analysis = analyze_query(schema_query);

    assert!(matches!(analysis.transaction_type, TransactionType::Schema));
    assert_eq!(analysis.primary_type.as_str(), "define");
}

#[test]
fn query_analysis_detects_delete_inside_multiline_pipeline() {
    let complex_query = r#"
        match
            $u isa user-account, has id $id;
            $id == "target-user";
        delete $u;
    "#;

    let analysis = analyze_query(complex_query);
    assert!(matches!(analysis.transaction_type, TransactionType::Write));
}

#[test]
fn query_analysis_detects_fetch_as_read_document_stream() {
    let fetch_query = r#"
        match $u isa user-account, has id $id;
        limit 5;
        fetch {
            "user": { $u.* },
            "id": $id
        };
    "#;

    let analysis = analyze_query(fetch_query);
    assert!(matches!(analysis.transaction_type, TransactionType::Read));
    assert!(analysis.returns_document_stream);
}
