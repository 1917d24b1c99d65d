//! Localized names of the namespaces the ProofreadPage extension adds to a Wikisource.
//!
//! Every wiki also accepts the canonical English names `Page` and `Index`, so those are used
//! for languages missing from the table.

/// Names of the `Page:` and `Index:` namespaces of one Wikisource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofreadNamespaces {
    pub page: &'static str,
    pub index: &'static str,
}

pub const CANONICAL: ProofreadNamespaces = ProofreadNamespaces {
    page: "Page",
    index: "Index",
};

// sorted by language code for binary search
const LOCALIZED: &[(&str, ProofreadNamespaces)] = &[
    ("ar", ns("صفحة", "فهرس")),
    ("as", ns("পৃষ্ঠা", "সূচী")),
    ("bn", ns("পাতা", "নির্ঘণ্ট")),
    ("de", ns("Seite", "Index")),
    ("en", CANONICAL),
    ("es", ns("Página", "Índice")),
    ("fr", ns("Page", "Livre")),
    ("gu", ns("પૃષ્ઠ", "સૂચિ")),
    ("he", ns("עמוד", "מפתח")),
    ("hi", ns("पृष्ठ", "अनुक्रमणिका")),
    ("it", ns("Pagina", "Indice")),
    ("kn", ns("ಪುಟ", "ಸೂಚಿ")),
    ("ml", ns("താൾ", "സൂചിക")),
    ("mr", ns("पान", "अनुक्रमणिका")),
    ("or", ns("ପୃଷ୍ଠା", "ସୂଚୀ")),
    ("pa", ns("ਪੰਨਾ", "ਇੰਡੈਕਸ")),
    ("pl", ns("Strona", "Indeks")),
    ("pt", ns("Página", "Galeria")),
    ("ru", ns("Страница", "Индекс")),
    ("sa", ns("पृष्ठम्", "अनुक्रमणिका")),
    ("ta", ns("பக்கம்", "அட்டவணை")),
    ("te", ns("పుట", "సూచిక")),
    ("uk", ns("Сторінка", "Індекс")),
    ("vi", ns("Trang", "Mục lục")),
];

const fn ns(page: &'static str, index: &'static str) -> ProofreadNamespaces {
    ProofreadNamespaces { page, index }
}

/// Look up the namespace names for `language`, falling back to [`CANONICAL`].
pub fn proofread_namespaces(language: &str) -> ProofreadNamespaces {
    LOCALIZED
        .binary_search_by(|(code, _)| (*code).cmp(language))
        .map(|i| LOCALIZED[i].1)
        .unwrap_or(CANONICAL)
}

impl ProofreadNamespaces {
    /// Title of page `number` of the scan `index`, e.g. `Page:Foo.djvu/12`.
    pub fn page_title(&self, index: &str, number: u32) -> String {
        format!("{}:{index}/{number}", self.page)
    }

    /// Title of the index page of the scan `index`, e.g. `Index:Foo.djvu`.
    pub fn index_title(&self, index: &str) -> String {
        format!("{}:{index}", self.index)
    }
}
