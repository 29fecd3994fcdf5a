use assert_matches::assert_matches;

use kira_cmft::domain::SupplementaryUrl;
use kira_cmft::error::CmftError;
use kira_cmft::geo::{bed_files, full_link, plain_name};

#[test]
fn parse_ftp_url() {
    let url: SupplementaryUrl = "ftp://ftp.ncbi.nlm.nih.gov/geo/samples/GSM537nnn/GSM537697/suppl/"
        .parse()
        .unwrap();
    assert_eq!(url.path(), "geo/samples/GSM537nnn/GSM537697/suppl");
}

#[test]
fn parse_https_url() {
    let url: SupplementaryUrl = "https://ftp.ncbi.nlm.nih.gov/geo/samples/GSM1nnn/GSM1/suppl"
        .parse()
        .unwrap();
    assert_eq!(url.path(), "geo/samples/GSM1nnn/GSM1/suppl");
}

#[test]
fn parse_url_without_host() {
    let err = "ftp:///geo/samples/GSM1nnn/GSM1/suppl/"
        .parse::<SupplementaryUrl>()
        .unwrap_err();
    assert_matches!(err, CmftError::InvalidSupplementaryUrl(_));
}

#[test]
fn parse_url_without_scheme() {
    let err = "ftp.ncbi.nlm.nih.gov/geo/samples"
        .parse::<SupplementaryUrl>()
        .unwrap_err();
    assert_matches!(err, CmftError::InvalidSupplementaryUrl(_));
}

#[test]
fn link_and_name_helpers() {
    assert_eq!(
        full_link("ftp.ncbi.nlm.nih.gov", "geo/samples/GSM1nnn/GSM1/suppl", "GSM1_a.bed.gz"),
        "ftp://ftp.ncbi.nlm.nih.gov/geo/samples/GSM1nnn/GSM1/suppl/GSM1_a.bed.gz"
    );
    assert_eq!(plain_name("GSM1_a.bed.gz"), "GSM1_a.bed");
    assert_eq!(plain_name("GSM1_a.bed"), "GSM1_a.bed");

    let names = vec![
        "GSM1_a.bed.gz".to_string(),
        "GSM1_a.wig.gz".to_string(),
        "filelist.txt".to_string(),
    ];
    assert_eq!(bed_files(names, ".bed.gz"), vec!["GSM1_a.bed.gz".to_string()]);
}
