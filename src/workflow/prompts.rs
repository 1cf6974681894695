//! 提示词模板
//!
//! 具体措辞属于配置（可在 TOML 配置文件的 `[prompts]` 中覆盖），
//! 这里只负责把批次名称、用户指令、固定约束拼成最终发送的文本。

use serde::Deserialize;

use crate::models::ResultHistory;

/// 汇总时分隔各批次结果的标记
pub const BATCH_DELIMITER: &str = "--- NEXT DOCUMENT ---";

/// 历史为空时汇总返回的固定提示
pub const NOTHING_TO_CONSOLIDATE: &str =
    "Keine Analyseergebnisse vorhanden - es gibt nichts zu konsolidieren.";

/// 未指定批次名称时使用的默认名称
pub const DEFAULT_BATCH_LABEL: &str = "Aktuelle Ausschreibung";

const EXTRACTION_DIRECTIVE: &str = r#"Wichtig:
1. Verwenden Sie NUR die hochgeladenen Dokumente als Quelle.
2. Extrahieren Sie nur präzise Daten und zitieren Sie bei Fakten die Quelle (Dateiname oder Dokumenttitel)."#;

const CONSOLIDATION_DIRECTIVE: &str = r#"Sie erhalten mehrere Markdown-Tabellen, die jeweils aus der Analyse eines Dokumentenpakets derselben Ausschreibung stammen. Die Tabellen sind durch die Markierung "--- NEXT DOCUMENT ---" getrennt.

Aufgabe:
1. Führen Sie alle Tabellen zu GENAU EINER Markdown-Tabelle mit zwei Spalten (Kriterium | Ergebnis) zusammen.
2. Jedes Kriterium darf nur einmal vorkommen; doppelte Zeilen werden zusammengeführt.
3. Wenn sich die Werte eines Kriteriums zwischen den Tabellen widersprechen, geben Sie beide Werte an ("Widerspruch: [Wert A] vs. [Wert B]") oder übernehmen Sie den vollständigeren Wert. Verwerfen Sie keinen Wert stillschweigend.
4. Geben Sie nur die Tabelle aus, ohne JSON, Code-Blöcke oder zusätzliche Erklärungen."#;

const DEFAULT_INSTRUCTION: &str = r#"**Rolle:**
Du bist ein hochpräziser, streng regelbasierter KI-Assistent zur Analyse öffentlicher Ausschreibungsunterlagen. Deine Aufgabe ist es, **ausschließlich** die relevanten Daten aus den beigefügten Dokumenten zu extrahieren.

**Ziel:**
Extrahiere die Inhalte zu den unten genannten Kriterien und präsentiere das Ergebnis in einer einzigen, sauberen **Markdown-Tabelle**.

**Zu analysierende Kriterien:**
1. Projektbeschreibung
2. Technologie
3. Unternehmensgröße/Umsatz
4. Zertifizierungen
5. Kompetenzen Schlüsselpersonal
6. Anzahl Schlüsselpersonal
7. Vor-Ort/Remote
8. Versicherungshöhe
9. Referenzen

**Arbeitsregeln:**
1. **Quellenbasis:** Verwende ausschließlich die beigefügten Dokumente. Kein Weltwissen, keine Annahmen.
2. **Fehlende Angaben:** Ist eine Information nicht explizit vorhanden, mehrdeutig oder nicht belegbar, gib **"Keine Angabe"** aus.
3. **Widersprüche:** Widersprechen sich Angaben, gib beide Varianten als **"Widerspruch: [Text A] vs. [Text B]"** aus. Triff keine Entscheidung.
4. **Finanzielle/Allgemeine Kriterien:** Für Unternehmensgröße/Umsatz, Versicherungshöhe und Referenzen nur konkrete Zahlen, Beträge oder eindeutig beschriebene Projekte. Allgemeine Phrasen gelten als "Keine Angabe".
5. **Zertifizierungen:** Nur wenn wortwörtlich genannt und eindeutig dem Anbieter zugeordnet, sonst **"Keine Angabe (unklare Zuordnung)"**.

**Ausgabeformat (zwingend):**
Eine einzige Markdown-Tabelle mit exakt zwei Spalten, ohne JSON, Code-Blöcke oder Erklärungen, Kriterien in der obigen Reihenfolge:

| Kriterium | Ergebnis (Dokumentnahe Wiedergabe) |
| :--- | :--- |
| Projektbeschreibung | ... |
| Technologie | ... |
| Unternehmensgröße/Umsatz | ... |
| Zertifizierungen | ... |
| Kompetenzen Schlüsselpersonal | ... |
| Anzahl Schlüsselpersonal | ... |
| Vor-Ort/Remote | ... |
| Versicherungshöhe | ... |
| Referenzen | ... |"#;

/// 可配置的提示词
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    /// 追加在用户指令之后的固定约束（只用上传文档、引用文件名）
    pub extraction_directive: String,
    /// 汇总多个批次结果时的指令
    pub consolidation_directive: String,
    /// 调用方没有给出指令时使用的默认提取指令
    pub default_instruction: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            extraction_directive: EXTRACTION_DIRECTIVE.to_string(),
            consolidation_directive: CONSOLIDATION_DIRECTIVE.to_string(),
            default_instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }
}

impl PromptTemplates {
    /// 构建单个批次的分析指令
    ///
    /// 包含：批次名称、实际附带的文件名、用户原始指令、固定约束
    pub fn build_extraction_prompt(
        &self,
        batch_label: &str,
        user_instruction: &str,
        filenames: &[String],
    ) -> String {
        let file_list: Vec<String> = filenames
            .iter()
            .enumerate()
            .map(|(i, name)| format!("  {}. {}", i + 1, name))
            .collect();

        format!(
            r#"AUSSCHREIBUNG: {}

Beigefügte Dokumente ({}):
{}

Bitte analysieren Sie ALLE beigefügten Dokumente dieser Ausschreibung.
Ihre Aufgabe ist es: {}

{}"#,
            batch_label,
            filenames.len(),
            file_list.join("\n"),
            user_instruction.trim(),
            self.extraction_directive
        )
    }

    /// 构建汇总指令：按历史顺序拼接各批次结果，中间用分隔标记隔开
    pub fn build_consolidation_prompt(&self, history: &ResultHistory) -> String {
        let sections: Vec<String> = history
            .iter()
            .map(|result| {
                format!(
                    "### {}\n\n{}",
                    result.batch_label,
                    result.text.trim()
                )
            })
            .collect();

        format!(
            "{}\n\n{}\n\n{}",
            self.consolidation_directive,
            BATCH_DELIMITER,
            sections.join(&format!("\n\n{}\n\n", BATCH_DELIMITER))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisResult;

    #[test]
    fn test_extraction_prompt_contains_all_parts() {
        let templates = PromptTemplates::default();
        let prompt = templates.build_extraction_prompt(
            "Los 2",
            "  extract project scope  ",
            &["spec.pdf".to_string(), "terms.docx".to_string()],
        );

        assert!(prompt.starts_with("AUSSCHREIBUNG: Los 2"));
        assert!(prompt.contains("Ihre Aufgabe ist es: extract project scope\n"));
        assert!(prompt.contains("  1. spec.pdf\n  2. terms.docx"));
        assert!(prompt.contains("NUR die hochgeladenen Dokumente"));
        assert!(prompt.contains("zitieren Sie bei Fakten die Quelle"));
    }

    #[test]
    fn test_consolidation_prompt_orders_batches() {
        let templates = PromptTemplates::default();
        let mut history = ResultHistory::new();
        history.append(AnalysisResult::new("A", "| Technologie | Java |", vec![]));
        history.append(AnalysisResult::new("B", "| Technologie | Rust |", vec![]));

        let prompt = templates.build_consolidation_prompt(&history);
        let a = prompt.find("| Technologie | Java |").unwrap();
        let b = prompt.find("| Technologie | Rust |").unwrap();
        assert!(a < b);

        let between = &prompt[a..b];
        assert!(between.contains(BATCH_DELIMITER));

        // 同样的输入总是得到同样的文本
        assert_eq!(prompt, templates.build_consolidation_prompt(&history));
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let templates: PromptTemplates =
            toml::from_str(r#"consolidation_directive = "merge please""#).unwrap();
        assert_eq!(templates.consolidation_directive, "merge please");
        assert_eq!(
            templates.extraction_directive,
            PromptTemplates::default().extraction_directive
        );
    }
}
