//! The documented results format parses and compares.

use rattest_domain::compare_documents;
use rattest_types::ResultsDocument;

const DOCUMENT: &str = r#"{
  "schema": "rattest.results.v1",
  "objects": {
    "hCenterRes": {
      "title": "3-15 MeV electrons at the center",
      "class": "TH1F",
      "edges": [-1000.0, -500.0, 0.0, 500.0, 1000.0],
      "contents": [3.0, 40.0, 45.0, 4.0],
      "errors": [1.73, 6.32, 6.71, 2.0],
      "entries": 92.0,
      "functions": [
        {"class": "TF1", "name": "gaus",
         "parameters": [
           {"name": "Constant", "value": 40.1, "error": 1.2},
           {"name": "Mean", "value": 2.5, "error": 10.0},
           {"name": "Sigma", "value": 300.0, "error": 12.0}
         ]}
      ]
    },
    "hReconVsEnergy": {
      "edges": [3.0, 9.0, 15.0],
      "contents": [10.0, 12.0],
      "entries": 22.0
    }
  }
}"#;

#[test]
fn documented_format_parses() {
    let doc = ResultsDocument::from_slice(DOCUMENT.as_bytes()).unwrap();
    assert_eq!(
        doc.names().collect::<Vec<_>>(),
        vec!["hCenterRes", "hReconVsEnergy"]
    );
    let h = &doc.objects["hCenterRes"];
    assert_eq!(h.class, "TH1F");
    assert!(h.validate().is_ok());
    assert_eq!(doc.objects["hReconVsEnergy"].class, "TH1D");
}

#[test]
fn document_compared_with_itself_passes_with_fit_table() {
    let doc = ResultsDocument::from_slice(DOCUMENT.as_bytes()).unwrap();
    let cmp = compare_documents(&doc, &doc.clone(), 0.01).unwrap();

    assert!(cmp.overall_pass);
    let center = &cmp.results[0];
    assert_eq!(center.name, "hCenterRes");
    let params = center.fit_parameters.as_ref().unwrap();
    assert_eq!(params.len(), 3);
    assert!(params.iter().all(|p| p.sigma == 0.0 && !p.is_flagged()));
    assert!(cmp.results[1].fit_parameters.is_none());
}
