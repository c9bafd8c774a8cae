use super::*;

/// Publication search endpoint of the OpenAIRE API.
const ENDPOINT: &str = "https://api.openaire.eu/search/publications";

/// Largest page requested at once.
const PAGE_SIZE: usize = 100;

/// Searches the OpenAIRE research graph.
///
/// OpenAIRE's JSON is a mechanical translation of its XML: text nodes become `{"$": ...}`,
/// attributes become `@`-prefixed keys, and an element that occurs once is an object where one
/// that repeats is a list. Every field here therefore goes through [`one_or_many`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenaireAdapter;

/// Response envelope.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
  /// `response`
  #[serde(deserialize_with = "lenient")]
  response: Body,
}

/// `response`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Body {
  /// `results`, `null` when nothing matched
  #[serde(deserialize_with = "lenient")]
  results: Results,
}

/// `results`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Results {
  /// One entry per publication
  #[serde(deserialize_with = "one_or_many")]
  result: Vec<Entry>,
}

/// `result[]`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Entry {
  /// `metadata`
  #[serde(deserialize_with = "lenient")]
  metadata: Metadata,
}

/// `metadata`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Metadata {
  /// `oaf:entity`
  #[serde(rename = "oaf:entity", deserialize_with = "lenient")]
  entity: Entity,
}

/// `oaf:entity`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Entity {
  /// `oaf:result`, the publication itself
  #[serde(rename = "oaf:result", deserialize_with = "lenient")]
  result: Publication,
}

/// The publication record.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Publication {
  /// Titles; the first is used
  #[serde(deserialize_with = "one_or_many")]
  title:            Vec<Text>,
  /// Authors
  #[serde(deserialize_with = "one_or_many")]
  creator:          Vec<Text>,
  /// Persistent identifiers
  #[serde(deserialize_with = "one_or_many")]
  pid:              Vec<Pid>,
  /// Abstracts
  #[serde(deserialize_with = "one_or_many")]
  description:      Vec<Text>,
  /// Acceptance date
  #[serde(deserialize_with = "lenient")]
  dateofacceptance: Text,
  /// Hosted copies
  #[serde(deserialize_with = "one_or_many")]
  instance:         Vec<Instance>,
}

/// A text node, `{"$": "..."}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Text {
  /// Content
  #[serde(rename = "$", deserialize_with = "lenient_string")]
  value: String,
}

/// A persistent identifier, `{"@classid": "doi", "$": "..."}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Pid {
  /// Identifier scheme
  #[serde(rename = "@classid", deserialize_with = "lenient_string")]
  class_id: String,
  /// Value
  #[serde(rename = "$", deserialize_with = "lenient_string")]
  value:    String,
}

/// A hosted copy.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Instance {
  /// Locations of the copy
  #[serde(deserialize_with = "one_or_many")]
  webresource: Vec<WebResource>,
}

/// A location.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebResource {
  /// `{"$": "https://..."}`
  #[serde(deserialize_with = "lenient")]
  url: Text,
}

#[async_trait]
impl Adapter for OpenaireAdapter {
  fn source(&self) -> Source { Source::Openaire }

  fn requests(&self, keyword: &str, limit: usize) -> Result<Vec<HttpRequest>> {
    Ok(
      pages(limit, PAGE_SIZE)
        .into_iter()
        .map(|(offset, size)| {
          HttpRequest::get(ENDPOINT)
            .query("keywords", keyword)
            .query("page", offset / PAGE_SIZE + 1)
            .query("size", size)
            .query("format", "json")
        })
        .collect(),
    )
  }

  fn parse(&self, keyword: &str, body: &[u8]) -> Result<Vec<Document>> {
    let response: SearchResponse = parse_json(Source::Openaire, body)?;
    Ok(
      response
        .response
        .results
        .result
        .into_iter()
        .filter_map(|entry| {
          let publication = entry.metadata.entity.result;
          let title = publication.title.first().and_then(|title| non_empty(&title.value))?;
          let doi = publication
            .pid
            .iter()
            .find(|pid| pid.class_id == "doi")
            .and_then(|pid| non_empty(&pid.value));

          let locations: Vec<&str> = publication
            .instance
            .iter()
            .flat_map(|instance| &instance.webresource)
            .map(|resource| resource.url.value.trim())
            .filter(|url| !url.is_empty())
            .collect();
          let pdf_url = locations
            .iter()
            .find(|url| url.to_lowercase().ends_with(".pdf"))
            .map(|url| url.to_string())
            .unwrap_or_default();
          let url = match (locations.last(), &doi) {
            (Some(url), _) => url.to_string(),
            (None, Some(doi)) => format!("https://doi.org/{doi}"),
            (None, None) => String::new(),
          };
          let id = doi.as_ref().map(|doi| doi.replace('/', "_")).unwrap_or_else(|| derived_id(&title));

          Some(Document {
            id,
            title,
            authors: publication.creator.iter().filter_map(|creator| non_empty(&creator.value)).collect(),
            abstract_text: publication
              .description
              .first()
              .map(|text| format::squash_whitespace(&text.value))
              .unwrap_or_default(),
            url,
            pdf_url,
            published: publication.dateofacceptance.value.trim().to_string(),
            doi,
            ..Document::new(Source::Openaire, keyword)
          })
        })
        .collect(),
    )
  }
}
