//! 键模板
//!
//! 形如 `user:${id}:friends` 的模式按 `${...}` 切分成固定片段与占位符，
//! `fixed.len() == arity + 1`。占位符名只起说明作用，替换按位置进行。

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTemplate {
    pattern: String,
    fixed: Vec<String>,
    placeholders: Vec<String>,
}

impl KeyTemplate {
    /// 解析模式；占位符个数与声明的 arity 不一致时返回 Configuration 错误
    pub fn compile(pattern: &str, arity: usize) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::Configuration(
                "a key pattern is required to create a collection".to_string(),
            ));
        }

        let mut fixed = Vec::new();
        let mut placeholders = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(open) = rest.find("${") {
            let after = &rest[open + 2..];
            // 未闭合的 ${ 按字面处理
            let Some(close) = after.find('}') else {
                break;
            };
            literal.push_str(&rest[..open]);
            fixed.push(std::mem::take(&mut literal));
            placeholders.push(after[..close].to_string());
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        fixed.push(literal);

        if placeholders.len() != arity {
            return Err(Error::Configuration(format!(
                "need {} ids in key pattern {:?}, found {}",
                arity,
                pattern,
                placeholders.len()
            )));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            fixed,
            placeholders,
        })
    }

    pub fn arity(&self) -> usize {
        self.placeholders.len()
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// 占位符名，只用于说明
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    fn check_arity(&self, given: usize) -> Result<()> {
        if given != self.arity() {
            return Err(Error::Arity {
                expected: self.arity(),
                given,
            });
        }
        Ok(())
    }

    /// 按顺序把 id 填进固定片段之间
    pub fn to_key<S: AsRef<str>>(&self, ids: &[S]) -> Result<String> {
        self.check_arity(ids.len())?;
        let mut key = self.fixed[0].clone();
        for (id, tail) in ids.iter().zip(&self.fixed[1..]) {
            key.push_str(id.as_ref());
            key.push_str(tail);
        }
        Ok(key)
    }

    /// 从具体键中取回 id；键与模板不匹配时返回 None
    ///
    /// 中间片段从上一次匹配的末尾向后查找，最后一个片段锚定在键的末尾。
    /// id 中包含固定片段文本时结果有歧义，这是已知限制。
    pub fn to_ids(&self, key: &str) -> Option<Vec<String>> {
        let head = &self.fixed[0];
        if !key.starts_with(head.as_str()) {
            return None;
        }
        if self.arity() == 0 {
            return (key == head).then(Vec::new);
        }

        let mut ids = Vec::with_capacity(self.arity());
        let mut pos = head.len();
        for segment in &self.fixed[1..self.arity()] {
            let found = key[pos..].find(segment.as_str())?;
            ids.push(key[pos..pos + found].to_string());
            pos += found + segment.len();
        }

        let tail = &self.fixed[self.arity()];
        if key.len() < pos + tail.len() || !key.ends_with(tail.as_str()) {
            return None;
        }
        ids.push(key[pos..key.len() - tail.len()].to_string());
        Some(ids)
    }

    /// 第一个 id
    pub fn to_id(&self, key: &str) -> Option<String> {
        self.to_ids(key)?.into_iter().next()
    }

    /// KEYS 使用的 glob 模式：已给出的 id 原样填入，其余尾部 id 替换为 `*`
    ///
    /// 固定片段与 id 中的 glob 元字符会被转义。
    pub fn glob<S: AsRef<str>>(&self, ids: &[S]) -> Result<String> {
        if ids.len() > self.arity() {
            return Err(Error::Arity {
                expected: self.arity(),
                given: ids.len(),
            });
        }
        let mut out = escape_glob(&self.fixed[0]);
        for (i, tail) in self.fixed[1..].iter().enumerate() {
            match ids.get(i) {
                Some(id) => out.push_str(&escape_glob(id.as_ref())),
                None => out.push('*'),
            }
            out.push_str(&escape_glob(tail));
        }
        Ok(out)
    }
}

fn escape_glob(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
