use std::{fmt, str::FromStr};

use thiserror::Error;

/// Prompt flavours a caller may request through `reviewType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    Comprehensive,
    Security,
    Performance,
    Api,
    Inline,
}

impl PromptTemplate {
    pub fn as_str(self) -> &'static str {
        match self {
            PromptTemplate::Comprehensive => "comprehensive",
            PromptTemplate::Security => "security",
            PromptTemplate::Performance => "performance",
            PromptTemplate::Api => "api",
            PromptTemplate::Inline => "inline",
        }
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Unknown review type '{0}'")]
    Unknown(String),
    #[error("Review type '{template}' is not available for {task}")]
    NotApplicable { template: PromptTemplate, task: Task },
}

impl FromStr for PromptTemplate {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "comprehensive" => Ok(PromptTemplate::Comprehensive),
            "security" => Ok(PromptTemplate::Security),
            "performance" => Ok(PromptTemplate::Performance),
            "api" => Ok(PromptTemplate::Api),
            "inline" => Ok(PromptTemplate::Inline),
            _ => Err(PromptError::Unknown(s.to_string())),
        }
    }
}

/// Template choice: picked from the code itself, or named by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewMode {
    #[default]
    Auto,
    Explicit(PromptTemplate),
}

impl ReviewMode {
    pub fn parse(raw: Option<&str>) -> Result<Self, PromptError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(ReviewMode::Auto),
            Some(s) if s.eq_ignore_ascii_case("auto") => Ok(ReviewMode::Auto),
            Some(s) => s.parse().map(ReviewMode::Explicit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Review,
    Fixes,
    Documentation,
    Complexity,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Task::Review => "code review",
            Task::Fixes => "code fixes",
            Task::Documentation => "documentation",
            Task::Complexity => "complexity analysis",
        })
    }
}

fn auto_review_template(code: &str) -> PromptTemplate {
    if code.contains("exec(") || code.contains("eval(") {
        PromptTemplate::Security
    } else if code.len() > 1000 || code.contains("loop") || code.contains("query") {
        PromptTemplate::Performance
    } else {
        PromptTemplate::Comprehensive
    }
}

fn auto_doc_template(code: &str) -> PromptTemplate {
    if code.contains("app.get(") || code.contains("@app.route") || code.contains("Request") {
        PromptTemplate::Api
    } else if code.contains("function") || code.contains("def") || code.contains("=>") {
        PromptTemplate::Inline
    } else {
        PromptTemplate::Comprehensive
    }
}

impl Task {
    pub fn allowed_templates(self) -> &'static [PromptTemplate] {
        use PromptTemplate::*;
        match self {
            Task::Review => &[Comprehensive, Security, Performance],
            Task::Documentation => &[Comprehensive, Api, Inline],
            Task::Fixes | Task::Complexity => &[Comprehensive],
        }
    }

    /// Resolve the template for `code`. Fixes and complexity have a single
    /// prompt, so an explicit choice there is accepted and ignored.
    pub fn template(self, mode: ReviewMode, code: &str) -> Result<PromptTemplate, PromptError> {
        match (self, mode) {
            (Task::Fixes | Task::Complexity, _) => Ok(PromptTemplate::Comprehensive),
            (Task::Review, ReviewMode::Auto) => Ok(auto_review_template(code)),
            (Task::Documentation, ReviewMode::Auto) => Ok(auto_doc_template(code)),
            (task, ReviewMode::Explicit(template)) => {
                if task.allowed_templates().contains(&template) {
                    Ok(template)
                } else {
                    Err(PromptError::NotApplicable { template, task })
                }
            }
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Task::Review => "Failed to generate code review",
            Task::Fixes => "Failed to suggest code fixes",
            Task::Documentation => "Failed to generate documentation",
            Task::Complexity => "Failed to analyze code complexity",
        }
    }

    pub fn system_prompt(self, language: &str) -> String {
        match self {
            Task::Review => "You are an expert code reviewer with 15+ years of experience. \
                 Provide detailed, actionable feedback."
                .to_string(),
            Task::Fixes => format!(
                "You are a senior {} developer. Refactor the code and fix any issues found.",
                language_name(language)
            ),
            Task::Documentation => "You are a technical documentation expert. \
                 Create clear, comprehensive documentation."
                .to_string(),
            Task::Complexity => "You are a code analysis expert. \
                 Provide detailed complexity analysis with metrics."
                .to_string(),
        }
    }

    pub fn user_prompt(self, template: PromptTemplate, language: &str, code: &str) -> String {
        let lang = language_name(language);
        let block = code_block(language, code);
        match (self, template) {
            (Task::Review, PromptTemplate::Security) => format!(
                "Focus on security analysis for this {lang} code. Identify:\n\
                 1. Security vulnerabilities\n\
                 2. Data validation issues\n\
                 3. Authentication/authorization flaws\n\
                 4. Injection attack vectors\n\
                 5. Sensitive data exposure risks\n\n\
                 Code:\n{block}"
            ),
            (Task::Review, PromptTemplate::Performance) => format!(
                "Analyze performance aspects of this {lang} code:\n\
                 1. Time complexity issues\n\
                 2. Memory usage optimization\n\
                 3. Database query efficiency\n\
                 4. Algorithmic improvements\n\
                 5. Resource management\n\n\
                 Code:\n{block}"
            ),
            (Task::Review, _) => format!(
                "Perform a comprehensive code review for this {lang} code. Analyze:\n\
                 1. Code quality and best practices\n\
                 2. Security vulnerabilities\n\
                 3. Performance issues\n\
                 4. Bug detection\n\
                 5. Maintainability concerns\n\
                 6. Suggestions for improvement\n\n\
                 Code:\n{block}\n\n\
                 Provide detailed feedback with specific line references and actionable recommendations."
            ),
            (Task::Documentation, PromptTemplate::Api) => format!(
                "Generate API documentation for this {lang} code:\n\
                 1. Endpoint descriptions\n\
                 2. Request/response formats\n\
                 3. Authentication requirements\n\
                 4. Error handling\n\
                 5. Rate limiting information\n\
                 6. Example requests/responses\n\n\
                 Code:\n{block}"
            ),
            (Task::Documentation, PromptTemplate::Inline) => format!(
                "Generate inline code comments and documentation for this {lang} code:\n\
                 1. Add meaningful comments\n\
                 2. Explain complex logic\n\
                 3. Document function parameters\n\
                 4. Add JSDoc/similar format comments\n\
                 5. Explain algorithms and data structures\n\n\
                 Code:\n{block}"
            ),
            (Task::Documentation, _) => format!(
                "Generate comprehensive documentation for this {lang} code:\n\
                 1. Overview and purpose\n\
                 2. Function/method documentation\n\
                 3. Parameter descriptions\n\
                 4. Return value explanations\n\
                 5. Usage examples\n\
                 6. Dependencies and requirements\n\n\
                 Code:\n{block}"
            ),
            (Task::Complexity, _) => format!(
                "Analyze the complexity of this {lang} code:\n\
                 1. Cyclomatic complexity\n\
                 2. Cognitive complexity\n\
                 3. Maintainability index\n\
                 4. Code duplication\n\
                 5. Technical debt indicators\n\
                 6. Refactoring recommendations\n\n\
                 Code:\n{block}\n\n\
                 Provide specific metrics and actionable recommendations."
            ),
            (Task::Fixes, _) => format!(
                "Analyze the following {lang} code and identify concrete issues: bugs, \
                 performance bottlenecks, readability problems, security vulnerabilities and \
                 departures from {lang} best practices. Do not report complexity metrics; \
                 focus only on fixes and refactoring.\n\n\
                 Code:\n{block}\n\n\
                 Return a JSON object with a single field `refactoringSuggestions`, an array of \
                 objects `{{ issue, description, priority, refactoredCode }}` where `priority` is \
                 \"High\", \"Medium\" or \"Low\" and `refactoredCode` is a complete snippet that \
                 fixes the issue. Return an empty array when nothing needs fixing."
            ),
        }
    }
}

pub const DETECTION_SYSTEM_PROMPT: &str =
    "You are an expert in identifying programming languages based on code syntax.";

pub fn detection_prompt(code: &str) -> String {
    format!(
        "Determine the programming language of the following snippet from its syntax, keywords \
         and structure. When several languages are mixed, report the dominant one.\n\n\
         Code:\n```\n{code}\n```\n\n\
         Reply with a ```json fenced block containing:\n\
         - language: string (e.g. \"JavaScript\", \"Python\", \"Java\"; \"Unknown\" if undecidable)\n\
         - confidence: number between 0 and 1\n\
         - details: short explanation of the clues used"
    )
}

fn language_name(language: &str) -> &str {
    if language.is_empty() {
        "source"
    } else {
        language
    }
}

fn code_block(language: &str, code: &str) -> String {
    format!("```{}\n{code}\n```", language.to_ascii_lowercase())
}
