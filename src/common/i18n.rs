// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANGUAGE: &str = "en";

// (idioma, código, mensagem)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("en", "unauthorized", "Missing or invalid authentication token."),
    ("en", "not_found", "The requested record does not exist."),
    ("en", "lead_not_found", "Lead not found."),
    ("en", "deal_not_found", "Deal not found."),
    ("en", "proposal_not_found", "Proposal not found."),
    ("en", "invalid_fields", "One or more fields are invalid."),
    ("en", "invalid_transition", "This status change is not allowed."),
    ("en", "conflict", "The record was changed concurrently. Please try again."),
    ("en", "timeout", "The operation took too long and was cancelled."),
    ("en", "internal", "An unexpected error occurred."),
    ("pt", "unauthorized", "Token de autenticação inválido ou ausente."),
    ("pt", "not_found", "O registro solicitado não existe."),
    ("pt", "lead_not_found", "Lead não encontrado."),
    ("pt", "deal_not_found", "Negócio não encontrado."),
    ("pt", "proposal_not_found", "Proposta não encontrada."),
    ("pt", "invalid_fields", "Um ou mais campos são inválidos."),
    ("pt", "invalid_transition", "Esta mudança de status não é permitida."),
    ("pt", "conflict", "O registro foi alterado ao mesmo tempo. Tente novamente."),
    ("pt", "timeout", "A operação demorou demais e foi cancelada."),
    ("pt", "internal", "Ocorreu um erro inesperado."),
];

/// Catálogo de mensagens de erro por idioma.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<(String, String), String>,
}

impl I18nStore {
    pub fn new() -> Self {
        let messages = MESSAGES
            .iter()
            .map(|(lang, code, msg)| ((lang.to_string(), code.to_string()), msg.to_string()))
            .collect();
        Self { messages }
    }

    /// Busca a mensagem no idioma pedido, caindo para o inglês e, por fim, para o próprio código.
    pub fn message(&self, lang: &str, code: &str) -> String {
        self.lookup(lang, code)
            .or_else(|| self.lookup(DEFAULT_LANGUAGE, code))
            .unwrap_or_else(|| code.to_string())
    }

    fn lookup(&self, lang: &str, code: &str) -> Option<String> {
        self.messages.get(&(lang.to_string(), code.to_string())).cloned()
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}
