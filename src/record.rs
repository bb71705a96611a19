//! Output types: extraction results and extracted document records.

use serde::{Deserialize, Serialize};

/// Result of running the hybrid extraction pipeline on one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Normalised reading-order text for the whole document.
    pub text: String,
    pub stats: ExtractionStats,
}

/// Counters for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub page_count: usize,
    pub text_blocks: usize,
    pub image_blocks: usize,
    /// Images whose OCR output made it into the text.
    pub ocr_contributions: usize,
    /// Images recognised as blank.
    pub empty_recognitions: usize,
    /// Images dropped because decoding or OCR failed.
    pub failed_blocks: usize,
    /// Image placements dropped at scan time (unresolvable bounds).
    pub skipped_placements: usize,
    /// Image blocks not processed because OCR is disabled.
    pub skipped_images: usize,
    pub duration_ms: u64,
}

/// The structured fields an LLM extracts from a document's text.
///
/// Field names are the wire names of the extraction schema. Missing fields
/// deserialise as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentFields {
    pub tipo_documento: String,
    pub numero_documento: String,
    pub institucion: String,
    pub facultad: String,
    pub ciudad: String,
    pub fecha: String,
    pub nombre_emisor: String,
    pub nombre_receptor: String,
    pub referencia: String,
    pub resumen_ejecutivo: String,
}

impl DocumentFields {
    /// Schema field names, in column order.
    pub const FIELD_NAMES: [&'static str; 10] = [
        "tipo_documento",
        "numero_documento",
        "institucion",
        "facultad",
        "ciudad",
        "fecha",
        "nombre_emisor",
        "nombre_receptor",
        "referencia",
        "resumen_ejecutivo",
    ];

    /// Field values in the same order as [`Self::FIELD_NAMES`].
    pub fn values(&self) -> [&str; 10] {
        [
            &self.tipo_documento,
            &self.numero_documento,
            &self.institucion,
            &self.facultad,
            &self.ciudad,
            &self.fecha,
            &self.nombre_emisor,
            &self.nombre_receptor,
            &self.referencia,
            &self.resumen_ejecutivo,
        ]
    }
}

/// One row of the results table: the source file plus its fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub nombre_archivo: String,
    #[serde(flatten)]
    pub fields: DocumentFields,
}

impl DocumentRecord {
    pub fn new(nombre_archivo: impl Into<String>, fields: DocumentFields) -> Self {
        Self {
            nombre_archivo: nombre_archivo.into(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let f: DocumentFields =
            serde_json::from_str(r#"{"tipo_documento":"Oficio","numero_documento":"1"}"#).unwrap();
        assert_eq!(f.tipo_documento, "Oficio");
        assert_eq!(f.ciudad, "");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let f: DocumentFields =
            serde_json::from_str(r#"{"fecha":"10/01/2024","extra":"x"}"#).unwrap();
        assert_eq!(f.fecha, "10/01/2024");
    }

    #[test]
    fn non_string_field_is_rejected() {
        assert!(serde_json::from_str::<DocumentFields>(r#"{"numero_documento":496}"#).is_err());
    }

    #[test]
    fn record_serialises_flat() {
        let record = DocumentRecord::new(
            "oficio.pdf",
            DocumentFields {
                tipo_documento: "Oficio".into(),
                ..Default::default()
            },
        );
        let v: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(v["nombre_archivo"], "oficio.pdf");
        assert_eq!(v["tipo_documento"], "Oficio");
        assert_eq!(v.as_object().unwrap().len(), 11);
    }

    #[test]
    fn values_follow_field_names() {
        let f = DocumentFields {
            ciudad: "Lima".into(),
            ..Default::default()
        };
        let idx = DocumentFields::FIELD_NAMES
            .iter()
            .position(|n| *n == "ciudad")
            .unwrap();
        assert_eq!(f.values()[idx], "Lima");
    }
}
