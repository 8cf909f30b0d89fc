//! Index field names and well-known field values.

pub const IDDOC: &str = "IDDOC";
pub const IDDOC_PARENT: &str = "IDDOC_PARENT";
pub const PI: &str = "PI";
pub const PI_TOPSTRUCT: &str = "PI_TOPSTRUCT";
pub const PI_PARENT: &str = "PI_PARENT";
pub const LOGID: &str = "LOGID";
pub const DOCTYPE: &str = "DOCTYPE";
pub const DOCSTRCT: &str = "DOCSTRCT";
pub const ISWORK: &str = "ISWORK";
pub const ISANCHOR: &str = "ISANCHOR";
pub const LABEL: &str = "LABEL";
pub const MD_TITLE: &str = "MD_TITLE";
pub const MD_SHELFMARK: &str = "MD_SHELFMARK";
pub const THUMBPAGENO: &str = "THUMBPAGENO";
pub const THUMBPAGENOLABEL: &str = "THUMBPAGENOLABEL";
pub const THUMBNAIL: &str = "THUMBNAIL";
pub const MIMETYPE: &str = "MIMETYPE";
pub const CURRENTNO: &str = "CURRENTNO";
pub const CURRENTNOSORT: &str = "CURRENTNOSORT";
pub const NUMPAGES: &str = "NUMPAGES";
pub const FILENAME_HTML: &str = "FILENAME_HTML-SANDBOXED";
pub const GROUPTYPE: &str = "GROUPTYPE";

/// Prefix of the field linking a group member to its group, followed by the group type.
pub const PREFIX_GROUPID: &str = "GROUPID_";
/// Prefix of the member sort field of a group, followed by the group type.
pub const PREFIX_GROUPORDER: &str = "GROUPORDER_";
/// Infix separating a field from its language code (`MD_TITLE_LANG_EN`).
pub const LANG_INFIX: &str = "_LANG_";

/// `DOCTYPE` of structural documents.
pub const DOCTYPE_DOCSTRCT: &str = "DOCSTRCT";
/// `DOCTYPE` of group records.
pub const DOCTYPE_GROUP: &str = "GROUP";

/// Fields every TOC query requests, before label/ancestor/grouping fields are added.
pub const REQUIRED_FIELDS: &[&str] = &[
    IDDOC,
    IDDOC_PARENT,
    PI,
    PI_TOPSTRUCT,
    PI_PARENT,
    LOGID,
    DOCTYPE,
    DOCSTRCT,
    ISWORK,
    ISANCHOR,
    LABEL,
    MD_TITLE,
    MD_SHELFMARK,
    THUMBPAGENO,
    THUMBPAGENOLABEL,
    THUMBNAIL,
    MIMETYPE,
    CURRENTNO,
    CURRENTNOSORT,
    NUMPAGES,
    FILENAME_HTML,
    GROUPTYPE,
];

/// Field name of the `lang` variant of `field`.
pub fn lang_field(field: &str, lang: &str) -> String {
    format!("{}{}{}", field, LANG_INFIX, lang.to_uppercase())
}
