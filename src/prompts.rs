//! Instruction template for LLM metadata extraction.
//!
//! The template is configuration: callers can replace it through
//! [`crate::config::AnalysisConfig::system_prompt`]. Whatever template is
//! used, the response is parsed against the fixed ten-field schema of
//! [`crate::record::DocumentFields`].

/// Default instruction template (Spanish administrative documents).
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"Eres un asistente especializado en documentos administrativos y académicos (oficios, cartas, resoluciones, informes, memorandos).

Analiza el texto del documento y devuelve ÚNICAMENTE un objeto JSON válido, sin texto adicional, con esta estructura:

{
  "tipo_documento": "String",
  "numero_documento": "String",
  "institucion": "String",
  "facultad": "String",
  "ciudad": "String",
  "fecha": "String",
  "nombre_emisor": "String",
  "nombre_receptor": "String",
  "referencia": "String",
  "resumen_ejecutivo": "String"
}

Reglas:
- tipo_documento: clase del documento (Resolución, Oficio, Carta, Informe, Memorando, etc.).
- numero_documento: solo la parte numérica significativa, sin prefijos ni ceros a la izquierda ("D000496" → "496").
- institucion y facultad: nombres completos.
- ciudad: solo si figura explícitamente; si no, "".
- fecha: formato DD/MM/AAAA.
- nombre_emisor y nombre_receptor: conserva grados y títulos ("Dr.", "Ing. M.Sc."); separa varios nombres con comas.
  En resoluciones el emisor son las autoridades firmantes y el receptor las personas sobre las que recae lo resuelto.
  En otros documentos el emisor es quien firma y el receptor a quien va dirigido.
- referencia: texto de la referencia, con fechas convertidas a (DD/MM/AAAA); si no hay, "".
- resumen_ejecutivo: síntesis precisa del propósito del documento.
- Formato de texto: en todos los valores deja un espacio después de cada punto (.), excepto en siglas o grados académicos compactos ("M.Sc.", "S.A.C.")."#;

/// Header placed before the document text in the user message.
pub const DOCUMENT_HEADER: &str = "DOCUMENTO A ANALIZAR:";

/// Build the user message carrying the extracted document text.
pub fn document_message(text: &str) -> String {
    format!("{}\n{}", DOCUMENT_HEADER, text)
}
