//! Canned replies of the shell and the strategies that pick among them.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Situations the shell has something to say about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Greeting,
    Goodbye,
    RegionFound,
    RegionNotFound,
    Ambiguous,
    Processing,
    Interrupted,
}

impl ResponseKind {
    pub const ALL: [ResponseKind; 7] = [
        ResponseKind::Greeting,
        ResponseKind::Goodbye,
        ResponseKind::RegionFound,
        ResponseKind::RegionNotFound,
        ResponseKind::Ambiguous,
        ResponseKind::Processing,
        ResponseKind::Interrupted,
    ];

    /// Phrase templates; `{region}` and `{pollutant}` are filled in by [`render`].
    pub fn phrases(self) -> &'static [&'static str] {
        match self {
            ResponseKind::Greeting => &[
                "🤖 Ciao! Scrivimi in linguaggio naturale e ti mostro le previsioni.\n\
                 Puoi chiedere qualcosa come: 'Come sarà l'aria in Europe?' o 'Analizza African Region'.",
                "🤖 Benvenuto! Chiedimi come cambierà l'aria in una regione e preparo le previsioni.",
            ],
            ResponseKind::Goodbye => &["👋 A presto!", "👋 Alla prossima, respira aria pulita!"],
            ResponseKind::RegionFound => &[
                "🔍 Regione trovata: {region}",
                "🔍 Perfetto, analizzo {region}.",
            ],
            ResponseKind::RegionNotFound => &[
                "❌ Non ho trovato una regione nella tua frase. Riprova.",
                "❗ Non sono riuscito a trovare la regione.",
            ],
            ResponseKind::Ambiguous => &[
                "❗ La tua frase corrisponde a più regioni. Sii più specifico.",
                "❗ Ho trovato più regioni possibili, quale intendi?",
            ],
            ResponseKind::Processing => &[
                "📊 Elaborazione: {pollutant}",
                "📊 Sto calcolando le previsioni per {pollutant}...",
            ],
            ResponseKind::Interrupted => &["⏹️ Elaborazione interrotta."],
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Picks the phrase template used for a situation.
pub trait ResponseStrategy: Send + Sync {
    fn select(&self, kind: ResponseKind) -> &'static str;
}

/// Always the first phrase. Deterministic, used by tests and one-shot runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedResponses;

impl ResponseStrategy for FixedResponses {
    fn select(&self, kind: ResponseKind) -> &'static str {
        kind.phrases()[0]
    }
}

/// Cycles through the phrases of each situation independently.
#[derive(Debug, Default)]
pub struct RotatingResponses {
    counters: [AtomicUsize; ResponseKind::ALL.len()],
}

impl RotatingResponses {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseStrategy for RotatingResponses {
    fn select(&self, kind: ResponseKind) -> &'static str {
        let phrases = kind.phrases();
        let n = self.counters[kind.index()].fetch_add(1, Ordering::Relaxed);
        phrases[n % phrases.len()]
    }
}

/// Substitute `{name}` placeholders.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}
