use crate::config::AppConfig;
use crate::error::ChatError;
use crate::models::{ChatMessage, ChatRequest, ContentPart, ImageUrl, MessageContent, Query, Role};

pub const SYSTEM_PROMPT: &str = "你是一位专业的学科导师，擅长解析各类题目。请按照以下格式输出解析：

1. 首先用亲切的语气打招呼，简要说明题目考察的知识点
2. 【知识点】列出本题涉及的核心知识点
3. 【启发式引导】
   - 理解题意：帮助学生理解题目
   - 分解问题：将问题拆解成小步骤
   - 联系生活：用生活实例类比
4. 【详细推导过程】逐步展示解题步骤，每一步都要有清晰的说明
5. 最后给出明确的答案

请确保解释清晰易懂，适合学生理解。如果是图片题目，请先识别图片中的题目内容再进行解析。";

pub const IMAGE_DEFAULT_INSTRUCTION: &str = "请识别并解析图片中的题目。";
const IMAGE_SUPPLEMENT_PREFIX: &str = "请解析这道题目。补充说明：";
const TEXT_PREFIX: &str = "请解析以下题目：\n\n";

/// Builds the chat payload for one question.
///
/// An image selects the vision model and a `[image_url, text]` part list; text alone
/// selects the text model and a single templated string.
pub fn build_request(query: &Query, config: &AppConfig) -> Result<ChatRequest, ChatError> {
  if query.is_empty() {
    return Err(ChatError::InvalidInput);
  }

  let text = query.text.as_deref().filter(|t| !t.is_empty());
  let system = ChatMessage {
    role: Role::System,
    content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
  };

  let (model, user) = match (&query.image, text) {
    (Some(image), text) => {
      let instruction = match text {
        Some(text) => format!("{IMAGE_SUPPLEMENT_PREFIX}{text}"),
        None => IMAGE_DEFAULT_INSTRUCTION.to_string(),
      };
      let content = MessageContent::Parts(vec![
        ContentPart::ImageUrl {
          image_url: ImageUrl {
            url: image.data_uri(),
          },
        },
        ContentPart::Text { text: instruction },
      ]);
      (config.vision_model.clone(), content)
    }
    (None, Some(text)) => (
      config.text_model.clone(),
      MessageContent::Text(format!("{TEXT_PREFIX}{text}")),
    ),
    (None, None) => return Err(ChatError::InvalidInput),
  };

  Ok(ChatRequest {
    model,
    messages: vec![
      system,
      ChatMessage {
        role: Role::User,
        content: user,
      },
    ],
    temperature: config.temperature,
    max_tokens: config.max_tokens,
  })
}
