use serde_json::{Value, json};
use vitrine::IndexRecord;

/// Turn a JSON object into an index record
pub fn record(value: Value) -> IndexRecord {
    serde_json::from_value(value).expect("fixture must be a JSON object")
}

/// A top-level work with its own PI
pub fn work(iddoc: i64, pi: &str, label: &str) -> Value {
    json!({
        "IDDOC": iddoc,
        "PI": pi,
        "PI_TOPSTRUCT": pi,
        "ISWORK": true,
        "DOCTYPE": "DOCSTRCT",
        "DOCSTRCT": "monograph",
        "LOGID": "LOG_0000",
        "THUMBPAGENO": 1,
        "THUMBNAIL": "00000001.tif",
        "NUMPAGES": 20,
        "LABEL": label
    })
}

/// A structure element inside the record `pi`
pub fn section(iddoc: i64, parent: i64, pi: &str, logid: &str, page: i64, label: &str) -> Value {
    json!({
        "IDDOC": iddoc,
        "IDDOC_PARENT": parent.to_string(),
        "PI_TOPSTRUCT": pi,
        "DOCTYPE": "DOCSTRCT",
        "DOCSTRCT": "chapter",
        "LOGID": logid,
        "THUMBPAGENO": page,
        "THUMBPAGENOLABEL": format!("[{}]", page),
        "LABEL": label
    })
}

/// A monograph with this outline:
///
/// ```text
/// 0 Monograph
/// 1   Preface
/// 2   Chapter 1
/// 3     Section 1.1
/// 4     Section 1.2
/// 5   Chapter 2
/// ```
pub fn monograph() -> Vec<IndexRecord> {
    [
        work(1, "PPN_MONO", "Monograph"),
        section(10, 1, "PPN_MONO", "LOG_1", 3, "Preface"),
        section(11, 1, "PPN_MONO", "LOG_2", 5, "Chapter 1"),
        section(12, 11, "PPN_MONO", "LOG_3", 6, "Section 1.1"),
        section(13, 11, "PPN_MONO", "LOG_4", 9, "Section 1.2"),
        section(14, 1, "PPN_MONO", "LOG_5", 15, "Chapter 2"),
    ]
    .into_iter()
    .map(record)
    .collect()
}

/// The periodical anchor `PER` with `volumes` volumes `PER_V1..`; volume 2 has one article.
pub fn periodical(volumes: i64) -> Vec<IndexRecord> {
    let mut records = vec![record(json!({
        "IDDOC": 100,
        "PI": "PER",
        "ISANCHOR": true,
        "DOCSTRCT": "periodical",
        "LABEL": "Periodical",
        "LABEL_LANG_DE": "Zeitschrift"
    }))];
    for n in 1..=volumes {
        let pi = format!("PER_V{}", n);
        let mut volume = work(100 + n, &pi, &format!("Volume {}", n));
        volume["IDDOC_PARENT"] = json!("100");
        volume["PI_PARENT"] = json!("PER");
        volume["DOCSTRCT"] = json!("volume");
        volume["CURRENTNO"] = json!(n.to_string());
        volume["CURRENTNOSORT"] = json!(n);
        volume["MD_YEAR"] = json!(if n % 2 == 0 { "1900" } else { "1901" });
        records.push(record(volume));
    }
    if volumes >= 2 {
        records.push(record(section(200, 102, "PER_V2", "LOG_1", 4, "Article")));
    }
    records
}

/// A group `SERIES` with members listed out of order
pub fn series() -> Vec<IndexRecord> {
    let member = |iddoc: i64, pi: &str, order: i64| {
        let mut value = work(iddoc, pi, pi);
        value["GROUPID_SERIES"] = json!("SERIES");
        value["GROUPORDER_SERIES"] = json!(order);
        record(value)
    };
    vec![
        record(json!({
            "IDDOC": 300,
            "PI": "SERIES",
            "DOCTYPE": "GROUP",
            "GROUPTYPE": "SERIES",
            "MD_SHELFMARK": "Ms. 42"
        })),
        member(301, "PART_B", 2),
        member(302, "PART_A", 1),
        member(303, "PART_C", 3),
    ]
}
