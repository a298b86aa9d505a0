// src/common/i18n.rs

use std::collections::HashMap;

const FALLBACK_LANG: &str = "pt";

// Traduções embutidas no binário: idioma -> (código do erro -> mensagem)
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    /// Carrega os arquivos de `locales/` que foram compilados junto com o binário.
    pub fn embedded() -> anyhow::Result<Self> {
        let mut store = Self::default();
        store.load("pt", include_str!("../../locales/pt.json"))?;
        store.load("en", include_str!("../../locales/en.json"))?;
        Ok(store)
    }

    fn load(&mut self, lang: &str, raw: &str) -> anyhow::Result<()> {
        let table: HashMap<String, String> = serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("Arquivo de tradução '{}' inválido: {}", lang, e))?;
        self.messages.insert(lang.to_string(), table);
        Ok(())
    }

    /// Mensagem para o código no idioma pedido; cai para português e, por fim, no próprio código.
    pub fn message(&self, lang: &str, code: &str) -> String {
        [lang, FALLBACK_LANG]
            .iter()
            .filter_map(|l| self.messages.get(*l))
            .find_map(|table| table.get(code))
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}
