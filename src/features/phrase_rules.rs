use super::{Rule, RuleHit};
use crate::config::{PhraseCategory, Stacking, TextField};
use crate::email::EmailRecord;

/// Case-insensitive keyword rule over subject and/or body.
pub struct PhraseRule {
    id: String,
    category: PhraseCategory,
}

impl PhraseRule {
    pub fn new(id: &str, category: &PhraseCategory) -> Self {
        Self {
            id: id.to_string(),
            category: category.clone(),
        }
    }

    fn inspected_text(&self, email: &EmailRecord) -> Vec<String> {
        self.category
            .fields
            .iter()
            .map(|field| match field {
                TextField::Subject => email.subject.to_lowercase(),
                TextField::Body => email.body.to_lowercase(),
            })
            .collect()
    }
}

impl Rule for PhraseRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn evaluate(&self, email: &EmailRecord) -> Vec<RuleHit> {
        let texts = self.inspected_text(email);
        let matched: Vec<&String> = self
            .category
            .phrases
            .iter()
            .filter(|phrase| texts.iter().any(|text| text.contains(phrase.as_str())))
            .collect();

        // A phrase inside a longer matched phrase ("immediately" in
        // "verify immediately") is the same occurrence and is not counted again
        let distinct = matched.iter().filter(|phrase| {
            !matched
                .iter()
                .any(|other| other.len() > phrase.len() && other.contains(phrase.as_str()))
        });

        let mut hits = Vec::new();
        for phrase in distinct {
            hits.push(RuleHit::new(
                &self.id,
                self.category.deduction,
                format!("{}: \"{}\"", self.category.label, phrase),
                phrase.as_str(),
            ));

            if self.category.stacking == Stacking::Once {
                break;
            }
        }

        hits
    }
}
